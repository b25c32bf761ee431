// Expression evaluator properties: arithmetic promotion, concatenation,
// coercion asymmetry and precedence

use snxscript::interpreter::errors::ErrorKind;
use snxscript::parser::parse_postfix;
use snxscript::{Value, evaluate};

fn error_kind(expr: &str) -> Option<ErrorKind> {
    evaluate(expr).as_error().map(|err| err.kind)
}

#[test]
fn integer_arithmetic_matches_native() {
    let cases: [(i64, i64); 5] = [(7, 2), (6, 3), (-9, 4), (100, -7), (0, 5)];
    for (a, b) in cases {
        assert_eq!(evaluate(&format!("{a} + {b}")), Value::Int(a + b));
        assert_eq!(evaluate(&format!("{a} - {b}")), Value::Int(a - b));
        assert_eq!(evaluate(&format!("{a} * {b}")), Value::Int(a * b));
        assert_eq!(evaluate(&format!("{a} % {b}")), Value::Int(a % b));
        let expected = if a % b == 0 {
            Value::Int(a / b)
        } else {
            Value::Float(a as f64 / b as f64)
        };
        assert_eq!(evaluate(&format!("{a} / {b}")), expected);
    }
}

#[test]
fn division_promotion() {
    assert_eq!(evaluate("7 / 2"), Value::Float(3.5));
    assert_eq!(evaluate("6 / 2"), Value::Int(3));
    assert_eq!(evaluate("7 % 2"), Value::Int(1));
    assert_eq!(evaluate("1.5 * 2"), Value::Float(3.0));
}

#[test]
fn zero_divisors_are_runtime_errors() {
    assert_eq!(error_kind("5 % 0"), Some(ErrorKind::Runtime));
    assert_eq!(error_kind("5 / 0"), Some(ErrorKind::Runtime));
    assert_eq!(error_kind("5.0 / 0.0"), Some(ErrorKind::Runtime));
}

#[test]
fn concatenation_regroups() {
    let expected = Value::string("abc");
    assert_eq!(evaluate(r#""a" + "b" + "c""#), expected);
    assert_eq!(evaluate(r#"("a" + "b") + "c""#), expected);
    assert_eq!(evaluate(r#""a" + ("b" + "c")"#), expected);
}

#[test]
fn addition_coerces_but_equality_does_not() {
    assert_eq!(evaluate(r#""5" + 3"#), Value::Int(8));
    assert_eq!(error_kind(r#""5" == 5"#), Some(ErrorKind::Type));
    assert_eq!(evaluate("5 == 5.0"), Value::Bool(true));
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(evaluate("2 + 3 * 4"), Value::Int(14));
    assert_eq!(evaluate("(2 + 3) * 4"), Value::Int(20));
    assert_eq!(evaluate("10 - 4 - 3"), Value::Int(3));
    assert_eq!(evaluate("1 < 2 && 3 > 4 || true"), Value::Bool(true));
    assert_eq!(evaluate("!(1 == 2)"), Value::Bool(true));
    assert_eq!(evaluate("-3 + -2"), Value::Int(-5));
}

#[test]
fn postfix_form() {
    let postfix = parse_postfix("1 + 2 * 3").unwrap();
    let rendered: Vec<String> = postfix.iter().map(|t| t.kind.to_string()).collect();
    assert_eq!(rendered, vec!["1", "2", "3", "*", "+"]);
}

#[test]
fn malformed_input_yields_error_values() {
    assert_eq!(error_kind("(1 + 2"), Some(ErrorKind::Syntax));
    assert_eq!(error_kind("1 +"), Some(ErrorKind::Syntax));
    assert_eq!(error_kind("\"open"), Some(ErrorKind::Syntax));
    assert_eq!(error_kind("true + 1"), Some(ErrorKind::Type));
    assert_eq!(error_kind("1 && true"), Some(ErrorKind::Type));
}
