//=============================================
// src/interpreter/mod.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Line-oriented execution engine for snx scripts
// Objective: Dispatch each source line, move the program cursor, track scope
//            levels and drive function calls through a single return stack
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports & Re-exports
//=============================================

mod blocks;
pub mod errors;
mod statement;

use std::collections::VecDeque;
use std::io::{self, Write};

use tracing::{debug, error, info, warn};

use crate::config::InterpreterConfig;
use crate::evaluator::evaluate;
use crate::platform::{
    CommandRunner, DryRunRunner, InputSource, MemoryOutput, ScriptedInput, ShellRunner, StdinInput,
};
use crate::source::SourceLines;
use crate::substitution::{handle_input, is_reserved, substitute};
use crate::symbol::{Function, FunctionTable, VariableStore};
use crate::value::Value;

pub use blocks::find_block_end;
use errors::{Diagnostic, ScriptError, Severity};
pub use statement::{BlockStyle, Statement, closes_block, opens_block, split_arguments};

pub const END_ANNOUNCEMENT: &str = "Program execution terminated by END command.";

/// Most recent diagnostics kept on the engine. Older ones are still written
/// to the error channel and counted in `dropped_diagnostics`.
pub const DIAGNOSTIC_HISTORY: usize = 1000;

//=============================================
//            Section 2: Execution State
//=============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Terminated,
}

/// Why a run stopped. `run` reports `Fatal` through its `Err` value; later
/// calls to `step` return it as the halt reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    EndStatement,
    EndOfSource,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halted(ExitReason),
}

/// One pending return. `body_scope` is the scope level the callee's
/// parameters live at; nested calls share their caller's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    pub return_line: usize,
    pub body_scope: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    pub program_counter: usize,
    pub scope_level: usize,
    pub return_stack: Vec<CallFrame>,
    pub function_depth: usize,
    pub block_style: BlockStyle,
    pub run_state: RunState,
}

impl ExecutionState {
    fn new(block_style: BlockStyle) -> Self {
        Self {
            program_counter: 1,
            scope_level: 0,
            return_stack: Vec::new(),
            function_depth: 0,
            block_style,
            run_state: RunState::Running,
        }
    }
}

//=============================================
//            Section 3: Engine Options & I/O
//=============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOptions {
    pub style: BlockStyle,
    pub announce_end: bool,
}

impl From<&InterpreterConfig> for EngineOptions {
    fn from(config: &InterpreterConfig) -> Self {
        Self {
            style: config.style,
            announce_end: config.announce_end,
        }
    }
}

/// The engine's external collaborators.
pub struct EngineIo {
    pub input: Box<dyn InputSource>,
    pub output: Box<dyn Write>,
    pub errors: Box<dyn Write>,
    pub commands: Box<dyn CommandRunner>,
}

impl EngineIo {
    /// Process stdin/stdout/stderr. `allow_exec = false` swaps the shell for
    /// a dry-run recorder.
    pub fn standard(allow_exec: bool) -> Self {
        let commands: Box<dyn CommandRunner> = if allow_exec {
            Box::new(ShellRunner)
        } else {
            Box::new(DryRunRunner::new())
        };
        Self {
            input: Box::new(StdinInput),
            output: Box::new(io::stdout()),
            errors: Box::new(io::stderr()),
            commands,
        }
    }

    /// Fully in-memory wiring for tests and embedders.
    pub fn in_memory(
        input: ScriptedInput,
        output: MemoryOutput,
        errors: MemoryOutput,
        commands: DryRunRunner,
    ) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            errors: Box::new(errors),
            commands: Box::new(commands),
        }
    }
}

impl Default for EngineIo {
    fn default() -> Self {
        Self::standard(true)
    }
}

//=============================================
//            Section 4: Engine
//=============================================

pub struct Engine {
    source: SourceLines,
    variables: VariableStore,
    functions: FunctionTable,
    state: ExecutionState,
    options: EngineOptions,
    io: EngineIo,
    diagnostics: VecDeque<Diagnostic>,
    dropped_diagnostics: usize,
    exit_reason: Option<ExitReason>,
}

impl Engine {
    //Function: new
    //Purpose: Build an engine over process stdio and the system shell
    //Inputs: source: SourceLines, options: EngineOptions
    //Returns: Self
    pub fn new(source: SourceLines, options: EngineOptions) -> Self {
        Self::with_io(source, options, EngineIo::default())
    }

    //Function: with_io
    //Purpose: Build an engine with injected collaborators
    //Inputs: source: SourceLines, options: EngineOptions, io: EngineIo
    //Returns: Self
    pub fn with_io(source: SourceLines, options: EngineOptions, io: EngineIo) -> Self {
        Self {
            source,
            variables: VariableStore::new(),
            functions: FunctionTable::new(),
            state: ExecutionState::new(options.style),
            options,
            io,
            diagnostics: VecDeque::new(),
            dropped_diagnostics: 0,
            exit_reason: None,
        }
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn style(&self) -> BlockStyle {
        self.state.block_style
    }

    /// The last `DIAGNOSTIC_HISTORY` diagnostics, oldest first.
    pub fn diagnostics(&self) -> &VecDeque<Diagnostic> {
        &self.diagnostics
    }

    pub fn dropped_diagnostics(&self) -> usize {
        self.dropped_diagnostics
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Current value of a live variable. `None` when the variable is not
    /// declared or its initialiser failed.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.value(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn source(&self) -> &SourceLines {
        &self.source
    }

    //Function: run
    //Purpose: Step until the program halts or a fatal error occurs
    //Inputs: &mut self
    //Returns: Result<ExitReason, ScriptError>
    pub fn run(&mut self) -> Result<ExitReason, ScriptError> {
        loop {
            match self.step()? {
                Step::Continue => {}
                Step::Halted(reason) => return Ok(reason),
            }
        }
    }

    //Function: step
    //Purpose: Execute the line under the cursor
    //Inputs: &mut self
    //Returns: Result<Step, ScriptError>
    pub fn step(&mut self) -> Result<Step, ScriptError> {
        if self.state.run_state == RunState::Terminated {
            return Ok(Step::Halted(
                self.exit_reason.unwrap_or(ExitReason::EndOfSource),
            ));
        }

        let line_number = self.state.program_counter;
        let Some(raw) = self.source.line(line_number).map(str::to_owned) else {
            return Ok(self.terminate(ExitReason::EndOfSource));
        };

        let style = self.state.block_style;
        let statement = Statement::parse(&raw, style);
        let result = if statement.is_control() {
            self.execute(statement, line_number)
        } else {
            let staged = handle_input(&raw, self.io.input.as_mut());
            let statement = Statement::parse(&staged, style);
            self.execute(statement, line_number)
        };

        if let Err(fatal) = &result {
            error!(line = line_number, %fatal, "fatal error");
            self.terminate(ExitReason::Fatal);
        }
        if let Err(err) = self.io.output.flush() {
            warn!(%err, "failed to flush program output");
        }
        result
    }

    //Function: evaluate_expression
    //Purpose: Substitute and evaluate an expression against the live store
    //Inputs: &mut self, expression: &str
    //Returns: Value
    pub fn evaluate_expression(&mut self, expression: &str) -> Value {
        let line = self.state.program_counter;
        self.evaluate_at(expression, line)
    }

    //=============================================
    //            Section 5: Statement Dispatch
    //=============================================

    fn execute(&mut self, statement: Statement<'_>, line: usize) -> Result<Step, ScriptError> {
        match statement {
            Statement::Style(name) => {
                match BlockStyle::from_name(name) {
                    Some(style) => {
                        debug!(line, %style, "block style changed");
                        self.state.block_style = style;
                    }
                    None => self.report(
                        line,
                        Severity::Warning,
                        ScriptError::syntax(format!(
                            "Unknown STYLE '{name}' ignored; expected 'end' or 'brackets'"
                        )),
                    ),
                }
                self.advance();
            }
            Statement::Blank | Statement::Comment => self.advance(),
            Statement::End => {
                if self.options.announce_end {
                    self.write_output(line, &format!("\n{END_ANNOUNCEMENT}\n"));
                }
                info!(line, "END statement reached");
                return Ok(self.terminate(ExitReason::EndStatement));
            }
            Statement::CloseBlock => self.close_block(line),
            Statement::Goto(target) => self.goto(target, line)?,
            Statement::Return { expression } => {
                if let Some(expression) = expression {
                    debug!(line, expression, "return value discarded");
                }
                if self.state.return_stack.is_empty() {
                    return Err(ScriptError::runtime(format!(
                        "'return' called outside of a function on line {line}"
                    )));
                }
                self.return_from_function(line);
            }
            Statement::FunctionHeader { name, parameters } => {
                self.define_function(name, &parameters, line)
            }
            Statement::Call { name, arguments } => self.call_function(name, &arguments, line),
            Statement::If { condition } => self.conditional(condition, line),
            Statement::Declaration { name, expression } => {
                self.declare_variable(name, expression, line)
            }
            Statement::Assignment { name, expression } => {
                self.assign_variable(name, expression, line)
            }
            Statement::Print {
                expression,
                newline,
            } => {
                let value = self.evaluate_at(expression, line);
                match value {
                    Value::Error(err) => self.report(line, Severity::Error, err),
                    value if newline => self.write_output(line, &format!("{value}\n")),
                    value => self.write_output(line, &value.to_string()),
                }
                self.advance();
            }
            Statement::Exec { expression } => {
                self.exec(expression, line);
                self.advance();
            }
            Statement::Unrecognized => {
                debug!(line, "unrecognized statement skipped");
                self.advance();
            }
        }
        Ok(Step::Continue)
    }

    fn close_block(&mut self, line: usize) {
        let closes_function_body = self.state.function_depth > 0
            && self
                .state
                .return_stack
                .last()
                .is_some_and(|frame| frame.body_scope == self.state.scope_level);

        if closes_function_body {
            self.return_from_function(line);
        } else if self.state.scope_level > 0 {
            self.exit_scope();
            self.advance();
        } else {
            self.report(
                line,
                Severity::Error,
                ScriptError::syntax("Unmatched block close with no open block"),
            );
            self.advance();
        }
    }

    fn goto(&mut self, target: &str, line: usize) -> Result<(), ScriptError> {
        let destination = target
            .parse::<usize>()
            .ok()
            .filter(|&number| self.source.contains_line(number))
            .ok_or_else(|| {
                ScriptError::runtime(format!(
                    "GOTO target {target} on line {line} is outside the program (1..={})",
                    self.source.len()
                ))
            })?;
        self.jump_to(destination);
        Ok(())
    }

    //=============================================
    //            Section 6: Functions
    //=============================================

    fn define_function(&mut self, name: &str, parameters: &[&str], line: usize) {
        if self.state.scope_level != 0 {
            self.report(
                line,
                Severity::Error,
                ScriptError::name(format!(
                    "Function '{name}' must be declared in the global scope"
                )),
            );
        } else {
            let function = Function {
                name: name.to_string(),
                parameters: parameters.iter().map(|p| p.to_string()).collect(),
                body_start_line: line,
            };
            match self.functions.register(function) {
                Ok(()) => debug!(line, name, ?parameters, "function registered"),
                Err(err) => self.report(line, Severity::Error, err),
            }
        }
        self.skip_block(line);
    }

    //Function: call_function
    //Purpose: Push a return frame, bind parameters and jump into the body
    //Inputs: &mut self, name: &str, arguments: &[&str], line: usize
    //Returns: ()
    fn call_function(&mut self, name: &str, arguments: &[&str], line: usize) {
        let Some(function) = self.functions.get(name).cloned() else {
            self.report(
                line,
                Severity::Error,
                ScriptError::name(format!("Function '{name}' is not defined")),
            );
            self.advance();
            return;
        };

        // Only the outermost call opens a level; nested calls share it.
        if self.state.function_depth == 0 {
            self.enter_scope();
        }
        let body_scope = self.state.scope_level;
        self.state.return_stack.push(CallFrame {
            return_line: line + 1,
            body_scope,
        });
        self.state.function_depth += 1;
        debug!(
            line,
            name,
            depth = self.state.function_depth,
            body_scope,
            "function call"
        );

        if arguments.len() > function.parameters.len() {
            self.report(
                line,
                Severity::Warning,
                ScriptError::runtime(format!(
                    "Function '{name}' takes {} argument(s) but {} were given; extra arguments ignored",
                    function.parameters.len(),
                    arguments.len()
                )),
            );
        }

        for (index, parameter) in function.parameters.iter().enumerate() {
            let value = match arguments.get(index) {
                Some(argument) => match self.evaluate_at(argument, line) {
                    Value::Error(err) => {
                        self.report(
                            line,
                            Severity::Warning,
                            ScriptError::runtime(format!(
                                "Argument for parameter '{parameter}' failed ({err}); defaulting to 0"
                            )),
                        );
                        Value::Int(0)
                    }
                    value => value,
                },
                None => {
                    self.report(
                        line,
                        Severity::Warning,
                        ScriptError::runtime(format!(
                            "Missing argument for parameter '{parameter}'; defaulting to 0"
                        )),
                    );
                    Value::Int(0)
                }
            };

            if self.variables.contains(parameter) {
                self.report(
                    line,
                    Severity::Error,
                    ScriptError::name(format!(
                        "Parameter '{parameter}' conflicts with a live variable of the same name"
                    )),
                );
                continue;
            }
            let bound = self
                .variables
                .declare(parameter, body_scope)
                .and_then(|()| self.variables.assign(parameter, value));
            if let Err(err) = bound {
                self.report(line, Severity::Error, err);
            }
        }

        self.jump_to(function.body_start_line + 1);
    }

    fn return_from_function(&mut self, line: usize) {
        let Some(frame) = self.state.return_stack.pop() else {
            return;
        };
        while self.state.scope_level > frame.body_scope {
            self.exit_scope();
        }
        self.state.function_depth = self.state.function_depth.saturating_sub(1);
        if self.state.function_depth == 0 {
            self.exit_scope();
        }
        debug!(
            line,
            return_line = frame.return_line,
            depth = self.state.function_depth,
            "function return"
        );
        self.jump_to(frame.return_line);
    }

    //=============================================
    //            Section 7: Conditionals & Variables
    //=============================================

    fn conditional(&mut self, condition: &str, line: usize) {
        match self.evaluate_at(condition, line) {
            Value::Error(err) => {
                self.report(line, Severity::Error, err);
                self.advance();
            }
            Value::Bool(true) => {
                self.enter_scope();
                self.advance();
            }
            Value::Bool(false) => self.skip_block(line),
            other => {
                self.report(
                    line,
                    Severity::Warning,
                    ScriptError::type_error(format!(
                        "Condition evaluated to {} instead of bool; treating it as false",
                        other.type_name()
                    )),
                );
                self.skip_block(line);
            }
        }
    }

    fn declare_variable(&mut self, name: &str, expression: &str, line: usize) {
        if is_reserved(name) {
            self.report(
                line,
                Severity::Error,
                ScriptError::name(format!("'{name}' is a reserved word")),
            );
        } else if let Err(err) = self.variables.declare(name, self.state.scope_level) {
            self.report(line, Severity::Error, err);
        } else {
            match self.evaluate_at(expression, line) {
                Value::Error(err) => self.report(line, Severity::Error, err),
                value => {
                    if let Err(err) = self.variables.assign(name, value) {
                        self.report(line, Severity::Error, err);
                    }
                }
            }
        }
        self.advance();
    }

    fn assign_variable(&mut self, name: &str, expression: &str, line: usize) {
        if !self.variables.contains(name) {
            self.report(
                line,
                Severity::Error,
                ScriptError::name(format!("Variable '{name}' used before declaration.")),
            );
        } else {
            match self.evaluate_at(expression, line) {
                Value::Error(err) => self.report(line, Severity::Error, err),
                value => {
                    if let Err(err) = self.variables.assign(name, value) {
                        self.report(line, Severity::Error, err);
                    }
                }
            }
        }
        self.advance();
    }

    fn exec(&mut self, expression: &str, line: usize) {
        match self.evaluate_at(expression, line) {
            Value::Error(err) => self.report(line, Severity::Error, err),
            value => {
                let command = value.to_string();
                debug!(line, %command, "exec");
                if let Err(err) = self.io.commands.run(&command) {
                    self.report(line, Severity::Error, ScriptError::runtime(err.to_string()));
                }
            }
        }
    }

    //=============================================
    //            Section 8: Helpers
    //=============================================

    fn evaluate_at(&mut self, expression: &str, line: usize) -> Value {
        let substituted = substitute(expression, &self.variables);
        for err in substituted.errors {
            self.report(line, Severity::Error, err);
        }
        evaluate(&substituted.text)
    }

    fn skip_block(&mut self, header_line: usize) {
        match find_block_end(&self.source, header_line + 1, self.state.block_style) {
            Ok(end) => self.jump_to(end + 1),
            Err(err) => {
                self.report(header_line, Severity::Error, err);
                self.jump_to(self.source.len() + 1);
            }
        }
    }

    fn enter_scope(&mut self) {
        self.state.scope_level += 1;
        debug!(scope = self.state.scope_level, "scope entered");
    }

    fn exit_scope(&mut self) {
        if self.state.scope_level == 0 {
            return;
        }
        let evicted = self.variables.evict_from(self.state.scope_level);
        self.state.scope_level -= 1;
        debug!(scope = self.state.scope_level, evicted, "scope exited");
    }

    fn advance(&mut self) {
        self.state.program_counter += 1;
    }

    fn jump_to(&mut self, line: usize) {
        debug!(from = self.state.program_counter, to = line, "jump");
        self.state.program_counter = line;
    }

    fn terminate(&mut self, reason: ExitReason) -> Step {
        self.state.run_state = RunState::Terminated;
        self.exit_reason = Some(reason);
        Step::Halted(reason)
    }

    fn write_output(&mut self, line: usize, text: &str) {
        if let Err(err) = self.io.output.write_all(text.as_bytes()) {
            self.report(
                line,
                Severity::Error,
                ScriptError::runtime(format!("Failed to write program output: {err}")),
            );
        }
    }

    fn report(&mut self, line: usize, severity: Severity, error: ScriptError) {
        let diagnostic = Diagnostic {
            line,
            severity,
            error,
        };
        match severity {
            Severity::Warning => warn!(line, code = diagnostic.error.code_str(), "{}", diagnostic.error),
            Severity::Error => error!(line, code = diagnostic.error.code_str(), "{}", diagnostic.error),
        }
        if let Err(err) = writeln!(self.io.errors, "{diagnostic}") {
            warn!(%err, "failed to write diagnostic to the error channel");
        }
        if self.diagnostics.len() == DIAGNOSTIC_HISTORY {
            self.diagnostics.pop_front();
            self.dropped_diagnostics += 1;
        }
        self.diagnostics.push_back(diagnostic);
    }
}
