use std::fmt;

use thiserror::Error;

/// Error categories reported by the evaluator and the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Type,
    Runtime,
    Name,
    Substitution,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "E001",
            ErrorKind::Type => "E002",
            ErrorKind::Runtime => "E003",
            ErrorKind::Name => "E004",
            ErrorKind::Substitution => "E005",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "Syntax Error",
            ErrorKind::Type => "Type Error",
            ErrorKind::Runtime => "Runtime Error",
            ErrorKind::Name => "Name Error",
            ErrorKind::Substitution => "Substitution Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Name, message)
    }

    pub fn substitution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Substitution, message)
    }

    pub fn code_str(&self) -> &'static str {
        self.kind.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A reported, non-fatal problem tied to the source line that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub severity: Severity,
    pub error: ScriptError,
}

impl Diagnostic {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on line {} [{}]: {}",
            self.severity,
            self.line,
            self.error.code_str(),
            self.error
        )
    }
}
