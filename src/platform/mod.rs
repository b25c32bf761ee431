//=============================================
// src/platform/mod.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: External collaborators consumed by the execution engine
// Objective: Isolate standard input, command execution and captured output
//            behind small traits with std and in-memory implementations
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Platform Errors
//=============================================

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::process::{Command, Stdio};
use std::rc::Rc;

use thiserror::Error;

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("command `{command}` exited with status {code:?}")]
    CommandFailed { command: String, code: Option<i32> },
}

//=============================================
//            Section 2: Input Sources
//=============================================

/// Line source for the `input` keyword. End of stream yields an empty line.
pub trait InputSource {
    fn read_line(&mut self) -> String;
}

/// Blocking reader over the process's standard input.
#[derive(Debug, Default)]
pub struct StdinInput;

impl InputSource for StdinInput {
    fn read_line(&mut self) -> String {
        let mut line = String::new();
        if let Err(err) = io::stdin().lock().read_line(&mut line) {
            tracing::warn!(%err, "failed to read from standard input");
            return String::new();
        }
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        line
    }
}

/// Pre-seeded input, used by tests and embedders.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    reads: usize,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            reads: 0,
        }
    }

    /// Number of lines requested so far, including reads past the end.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> String {
        self.reads += 1;
        self.lines.pop_front().unwrap_or_default()
    }
}

//=============================================
//            Section 3: Command Execution
//=============================================

/// Side-effect sink for `exec` statements.
pub trait CommandRunner {
    fn run(&mut self, command: &str) -> PlatformResult<()>;
}

/// Runs commands through the system shell with inherited stdio.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> PlatformResult<()> {
        let status = build_shell_command(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(PlatformError::CommandFailed {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }
}

#[cfg(windows)]
fn build_shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn build_shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

/// Records commands instead of running them. Clones share one log.
#[derive(Debug, Default, Clone)]
pub struct DryRunRunner {
    log: Rc<RefCell<Vec<String>>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&mut self, command: &str) -> PlatformResult<()> {
        tracing::info!(command, "dry run: command not executed");
        self.log.borrow_mut().push(command.to_string());
        Ok(())
    }
}

//=============================================
//            Section 4: Captured Output
//=============================================

/// Shared in-memory writer. Clones write into the same buffer, so a test can
/// hand one clone to the engine and read the other.
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.borrow()).into_owned()
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
