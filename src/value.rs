//=============================================
// src/value.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Dynamically typed scalar values for snx scripts
// Objective: Provide the Value tagged union, its literal and printable text
//            forms, and the numeric coercion helpers used by the evaluator
//=============================================

use std::fmt;

use serde_json::Value as JsonValue;

use crate::interpreter::errors::ScriptError;

//=============================================
//            Section 1: Value Kinds
//=============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    String,
    Error,
}

impl ValueKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Error => "error",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

//=============================================
//            Section 2: Runtime Values
//=============================================

/// Script runtime value. Strings hold their unquoted contents; the quoted
/// form is produced by [`Value::literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Error(ScriptError),
}

impl Value {
    pub fn string(contents: impl Into<String>) -> Self {
        Value::String(contents.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::Error(_) => ValueKind::Error,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    pub fn as_error(&self) -> Option<&ScriptError> {
        match self {
            Value::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Canonical source text: what the substitution stage writes back into a
    /// line so the tokenizer reads the same value again.
    pub fn literal(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(b) => b.to_string(),
            Value::String(s) => format!("\"{}\"", escape_string(s)),
            Value::Error(error) => error.to_string(),
        }
    }

    /// Turns a string whose whole content is a numeral into a number.
    /// Anything else is returned unchanged.
    pub fn coerce_numeric(&self) -> Value {
        match self {
            Value::String(s) if is_numeric_text(s) => {
                parse_numeral(s).unwrap_or_else(|| self.clone())
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Error(error) => write!(f, "{error}"),
            other => f.write_str(&other.literal()),
        }
    }
}

//=============================================
//            Section 3: Text Helpers
//=============================================

/// Whole floats keep a trailing `.0` so their text still reads as a float.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Parses numeral text; the presence of a decimal point selects float.
pub fn parse_numeral(text: &str) -> Option<Value> {
    if text.contains('.') {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    }
}

/// Optional sign, digits, at most one decimal point, at least one digit.
pub fn is_numeric_text(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut digits = 0;
    let mut points = 0;
    for ch in body.chars() {
        match ch {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

pub fn escape_string(contents: &str) -> String {
    let mut escaped = String::with_capacity(contents.len());
    for ch in contents.chars() {
        if ch == '"' || ch == '\\' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

//Function: value_to_json
//Purpose: Render a value for machine-readable output
//Inputs: value: &Value
//Returns: JsonValue
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Error(err) => serde_json::json!({
            "error": err.to_string(),
            "code": err.code_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_forms() {
        assert_eq!(Value::Int(-4).literal(), "-4");
        assert_eq!(Value::Float(3.5).literal(), "3.5");
        assert_eq!(Value::Float(3.0).literal(), "3.0");
        assert_eq!(Value::Bool(true).literal(), "true");
        assert_eq!(Value::string("hi").literal(), "\"hi\"");
        assert_eq!(Value::string("say \"x\"").literal(), r#""say \"x\"""#);
    }

    #[test]
    fn display_is_unquoted() {
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
    }

    #[test]
    fn numeric_text_detection() {
        assert!(is_numeric_text("5"));
        assert!(is_numeric_text("-2.5"));
        assert!(is_numeric_text(".5"));
        assert!(!is_numeric_text("1.2.3"));
        assert!(!is_numeric_text("abc"));
        assert!(!is_numeric_text(""));
        assert!(!is_numeric_text("-"));
    }

    #[test]
    fn coercion_only_touches_numeric_strings() {
        assert_eq!(Value::string("5").coerce_numeric(), Value::Int(5));
        assert_eq!(Value::string("2.5").coerce_numeric(), Value::Float(2.5));
        assert_eq!(Value::string("five").coerce_numeric(), Value::string("five"));
        assert_eq!(Value::Bool(true).coerce_numeric(), Value::Bool(true));
    }

    #[test]
    fn json_rendering() {
        assert_eq!(value_to_json(&Value::Int(3)), serde_json::json!(3));
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), JsonValue::Null);
        assert_eq!(value_to_json(&Value::string("a")), serde_json::json!("a"));
        let err = value_to_json(&Value::Error(ScriptError::runtime("Division by zero")));
        assert_eq!(err["code"], "E003");
    }
}
