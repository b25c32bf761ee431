//=============================================
// src/lib.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: snxscript library root
// Objective: Expose the expression evaluator, the execution engine and
//            their collaborators to the `snx` binary and embedders
//=============================================

pub mod config;
pub mod evaluator;
pub mod interpreter;
pub mod parser;
pub mod platform;
pub mod source;
pub mod substitution;
pub mod symbol;
pub mod tokenizer;
pub mod value;

pub use config::InterpreterConfig;
pub use evaluator::evaluate;
pub use interpreter::errors::{Diagnostic, ErrorKind, ScriptError, Severity};
pub use interpreter::{BlockStyle, Engine, EngineIo, EngineOptions, ExitReason, Step};
pub use source::SourceLines;
pub use value::Value;
