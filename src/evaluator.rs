//=============================================
// src/evaluator.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Postfix stack machine for snx expressions
// Objective: Apply per-operator type rules and coercions to produce one Value
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use crate::interpreter::errors::ScriptError;
use crate::parser::parse_postfix;
use crate::tokenizer::{Operator, Token, TokenKind};
use crate::value::{Value, parse_numeral};

//=============================================
//            Section 2: Entry Point
//=============================================

/// Evaluates an already substituted expression. Failures come back as
/// `Value::Error`, never as a panic or an `Err`.
pub fn evaluate(expr: &str) -> Value {
    match try_evaluate(expr) {
        Ok(value) => value,
        Err(error) => Value::Error(error),
    }
}

pub fn try_evaluate(expr: &str) -> Result<Value, ScriptError> {
    let postfix = parse_postfix(expr)?;
    evaluate_postfix(&postfix)
}

//=============================================
//            Section 3: Stack Machine
//=============================================

pub fn evaluate_postfix(postfix: &[Token]) -> Result<Value, ScriptError> {
    let mut stack: Vec<Value> = Vec::with_capacity(postfix.len());

    for token in postfix {
        match &token.kind {
            TokenKind::Number(text) => {
                let value = parse_numeral(text).ok_or_else(|| {
                    ScriptError::syntax(format!("Invalid numeric literal '{text}'"))
                })?;
                stack.push(value);
            }
            TokenKind::Boolean(b) => stack.push(Value::Bool(*b)),
            TokenKind::String(s) => stack.push(Value::String(s.clone())),
            TokenKind::Operator(Operator::Not) => {
                let operand = stack
                    .pop()
                    .ok_or_else(|| ScriptError::syntax("Insufficient operands for '!'"))?;
                stack.push(apply_not(&operand)?);
            }
            TokenKind::Operator(op) => {
                let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                    return Err(ScriptError::syntax(format!(
                        "Insufficient operands for '{op}'"
                    )));
                };
                stack.push(apply_binary(&lhs, &rhs, *op)?);
            }
            TokenKind::LeftParen | TokenKind::RightParen => {
                return Err(ScriptError::syntax("Mismatched parentheses"));
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => Err(ScriptError::syntax("Invalid expression")),
    }
}

//=============================================
//            Section 4: Operator Rules
//=============================================

fn apply_not(operand: &Value) -> Result<Value, ScriptError> {
    match operand {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => Err(ScriptError::type_error(
            "Operator '!' requires a boolean operand",
        )),
    }
}

pub fn apply_binary(lhs: &Value, rhs: &Value, op: Operator) -> Result<Value, ScriptError> {
    match op {
        Operator::And | Operator::Or => logical(lhs, rhs, op),
        Operator::EqualEqual | Operator::NotEqual => equality(lhs, rhs, op),
        Operator::Less | Operator::Greater | Operator::LessEqual | Operator::GreaterEqual => {
            ordering(lhs, rhs, op)
        }
        Operator::Plus => addition(lhs, rhs),
        Operator::Minus | Operator::Star | Operator::Slash | Operator::Percent => {
            arithmetic(lhs, rhs, op)
        }
        Operator::Not => Err(ScriptError::syntax("Operator '!' is unary")),
    }
}

fn logical(lhs: &Value, rhs: &Value, op: Operator) -> Result<Value, ScriptError> {
    match (lhs, rhs) {
        (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(match op {
            Operator::And => *l && *r,
            _ => *l || *r,
        })),
        _ => Err(ScriptError::type_error(format!(
            "Operator '{op}' requires boolean operands"
        ))),
    }
}

fn equality(lhs: &Value, rhs: &Value, op: Operator) -> Result<Value, ScriptError> {
    let equal = match (lhs, rhs) {
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Int(l), Value::Int(r)) => l == r,
        (l, r) if l.is_numeric() && r.is_numeric() => l.as_f64() == r.as_f64(),
        _ => {
            return Err(ScriptError::type_error(format!(
                "Cannot compare {} with {}",
                lhs.type_name(),
                rhs.type_name()
            )));
        }
    };
    Ok(Value::Bool(if op == Operator::NotEqual { !equal } else { equal }))
}

fn ordering(lhs: &Value, rhs: &Value, op: Operator) -> Result<Value, ScriptError> {
    let (Some(l), Some(r)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(ScriptError::type_error(format!(
            "Operator '{op}' requires numerical operands"
        )));
    };
    let result = match op {
        Operator::Less => l < r,
        Operator::Greater => l > r,
        Operator::LessEqual => l <= r,
        _ => l >= r,
    };
    Ok(Value::Bool(result))
}

fn addition(lhs: &Value, rhs: &Value) -> Result<Value, ScriptError> {
    if let (Value::String(l), Value::String(r)) = (lhs, rhs) {
        return Ok(Value::String(format!("{l}{r}")));
    }

    let l = lhs.coerce_numeric();
    let r = rhs.coerce_numeric();
    match (&l, &r) {
        _ if l.is_numeric() && r.is_numeric() => numeric(&l, &r, Operator::Plus),
        (Value::String(s), n) if n.is_numeric() => Ok(Value::String(format!("{s}{}", n.literal()))),
        (n, Value::String(s)) if n.is_numeric() => Ok(Value::String(format!("{}{s}", n.literal()))),
        _ => Err(ScriptError::type_error(format!(
            "Operator '+' not supported for {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn arithmetic(lhs: &Value, rhs: &Value, op: Operator) -> Result<Value, ScriptError> {
    let l = lhs.coerce_numeric();
    let r = rhs.coerce_numeric();
    if !(l.is_numeric() && r.is_numeric()) {
        return Err(ScriptError::type_error(format!(
            "Operator '{op}' requires numerical operands, found {} and {}",
            l.type_name(),
            r.type_name()
        )));
    }

    if op == Operator::Percent {
        // The int check looks at the operands as written, before coercion.
        let (Value::Int(_), Value::Int(_)) = (lhs, rhs) else {
            return Err(ScriptError::type_error(
                "Operator '%' requires integer operands",
            ));
        };
    }

    numeric(&l, &r, op)
}

fn numeric(lhs: &Value, rhs: &Value, op: Operator) -> Result<Value, ScriptError> {
    match (lhs, rhs) {
        (Value::Int(l), Value::Int(r)) => integer(*l, *r, op),
        _ => {
            let l = lhs.as_f64().unwrap_or_default();
            let r = rhs.as_f64().unwrap_or_default();
            float(l, r, op)
        }
    }
}

fn integer(l: i64, r: i64, op: Operator) -> Result<Value, ScriptError> {
    let overflow = || ScriptError::runtime(format!("Integer overflow in '{op}'"));
    let result = match op {
        Operator::Plus => l.checked_add(r).ok_or_else(overflow)?,
        Operator::Minus => l.checked_sub(r).ok_or_else(overflow)?,
        Operator::Star => l.checked_mul(r).ok_or_else(overflow)?,
        Operator::Slash => {
            if r == 0 {
                return Err(ScriptError::runtime("Division by zero"));
            }
            match l.checked_rem(r) {
                Some(0) => l.checked_div(r).ok_or_else(overflow)?,
                Some(_) => return Ok(Value::Float(l as f64 / r as f64)),
                None => return Err(overflow()),
            }
        }
        Operator::Percent => {
            if r == 0 {
                return Err(ScriptError::runtime("Modulo by zero"));
            }
            l.checked_rem(r).ok_or_else(overflow)?
        }
        other => {
            return Err(ScriptError::syntax(format!(
                "Operator '{other}' is not arithmetic"
            )));
        }
    };
    Ok(Value::Int(result))
}

fn float(l: f64, r: f64, op: Operator) -> Result<Value, ScriptError> {
    let result = match op {
        Operator::Plus => l + r,
        Operator::Minus => l - r,
        Operator::Star => l * r,
        Operator::Slash => {
            if r == 0.0 {
                return Err(ScriptError::runtime("Division by zero"));
            }
            l / r
        }
        other => {
            return Err(ScriptError::syntax(format!(
                "Operator '{other}' is not arithmetic"
            )));
        }
    };
    if !result.is_finite() {
        return Err(ScriptError::runtime(format!("Float overflow in '{op}'")));
    }
    Ok(Value::Float(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ErrorKind;

    fn error_kind(expr: &str) -> ErrorKind {
        match evaluate(expr) {
            Value::Error(error) => error.kind,
            other => panic!("expected error for {expr}, found {other:?}"),
        }
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(evaluate("1 + 2 * 3"), Value::Int(7));
        assert_eq!(evaluate("(1 + 2) * 3"), Value::Int(9));
        assert_eq!(evaluate("10 - 4 - 3"), Value::Int(3));
        assert_eq!(evaluate("-5 + 2"), Value::Int(-3));
        assert_eq!(evaluate("7 % 2"), Value::Int(1));
        assert_eq!(evaluate("-7 % 2"), Value::Int(-1));
    }

    #[test]
    fn test_division_promotion() {
        assert_eq!(evaluate("7 / 2"), Value::Float(3.5));
        assert_eq!(evaluate("6 / 2"), Value::Int(3));
        assert_eq!(evaluate("6.0 / 2"), Value::Float(3.0));
        assert_eq!(evaluate("1.5 * 2"), Value::Float(3.0));
    }

    #[test]
    fn test_zero_divisors_are_runtime_errors() {
        assert_eq!(error_kind("5 / 0"), ErrorKind::Runtime);
        assert_eq!(error_kind("5 % 0"), ErrorKind::Runtime);
        assert_eq!(error_kind("5.0 / 0.0"), ErrorKind::Runtime);
    }

    #[test]
    fn test_modulo_requires_written_integers() {
        assert_eq!(error_kind("5.0 % 2"), ErrorKind::Type);
        assert_eq!(error_kind("\"5\" % 2"), ErrorKind::Type);
    }

    #[test]
    fn test_string_concatenation_and_coercion() {
        assert_eq!(evaluate("\"a\" + \"b\""), Value::string("ab"));
        assert_eq!(evaluate("\"5\" + \"3\""), Value::string("53"));
        assert_eq!(evaluate("\"5\" + 3"), Value::Int(8));
        assert_eq!(evaluate("\"2.5\" + 1"), Value::Float(3.5));
        assert_eq!(evaluate("\"n=\" + 3"), Value::string("n=3"));
        assert_eq!(evaluate("1.5 + \"x\""), Value::string("1.5x"));
        assert_eq!(evaluate("\"10\" - 4"), Value::Int(6));
        assert_eq!(error_kind("\"ten\" - 4"), ErrorKind::Type);
        assert_eq!(error_kind("true + 1"), ErrorKind::Type);
    }

    #[test]
    fn test_equality_does_not_coerce() {
        assert_eq!(evaluate("1 == 1.0"), Value::Bool(true));
        assert_eq!(evaluate("\"a\" != \"b\""), Value::Bool(true));
        assert_eq!(evaluate("true == false"), Value::Bool(false));
        assert_eq!(error_kind("\"5\" == 5"), ErrorKind::Type);
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(evaluate("2 < 3 && 3 >= 3"), Value::Bool(true));
        assert_eq!(evaluate("2.5 > 3 || !false"), Value::Bool(true));
        assert_eq!(evaluate("!!true"), Value::Bool(true));
        assert_eq!(error_kind("\"a\" < \"b\""), ErrorKind::Type);
        assert_eq!(error_kind("1 && true"), ErrorKind::Type);
        assert_eq!(error_kind("!1"), ErrorKind::Type);
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(error_kind(""), ErrorKind::Syntax);
        assert_eq!(error_kind("1 2"), ErrorKind::Syntax);
        assert_eq!(error_kind("1 +"), ErrorKind::Syntax);
        assert_eq!(error_kind("!"), ErrorKind::Syntax);
        assert_eq!(error_kind("1.2.3 + 1"), ErrorKind::Syntax);
        assert_eq!(error_kind("99999999999999999999"), ErrorKind::Syntax);
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        assert_eq!(error_kind("9223372036854775807 + 1"), ErrorKind::Runtime);
    }

    #[test]
    fn test_float_overflow_is_reported() {
        let big = format!("{}.0", "9".repeat(300));
        let err = evaluate(&format!("{big} * {big}"));
        assert_eq!(err.as_error().map(|e| e.kind), Some(ErrorKind::Runtime));
        assert!(err.as_error().is_some_and(|e| e.message.contains("Float overflow")));
        assert_eq!(error_kind(&format!("{big} * -{big}")), ErrorKind::Runtime);
        assert!(!evaluate(&format!("{big} + 1")).is_error());
    }

    #[test]
    fn test_out_of_range_float_literal_is_rejected() {
        let huge = format!("{}.0", "9".repeat(400));
        assert_eq!(error_kind(&huge), ErrorKind::Syntax);
    }
}
