//=============================================
// src/substitution.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Text rewriting stages that run before tokenizing
// Objective: Replace identifiers and `${}` markers with literal text, and
//            splice standard-input lines in place of the `input` keyword
//=============================================

use crate::interpreter::errors::ScriptError;
use crate::platform::InputSource;
use crate::symbol::VariableStore;
use crate::value::{Value, escape_string};

/// Words the substitution stage never treats as variable names.
pub const RESERVED_WORDS: &[&str] = &[
    "true", "false", "var", "print", "println", "input", "func", "return", "if", "else", "while",
    "import", "END", "GOTO", "end", "STYLE", "exec",
];

pub const INPUT_KEYWORD: &str = "input";

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Result of a substitution pass. Errors are reported by the caller; the
/// text is always usable.
#[derive(Debug, Clone, PartialEq)]
pub struct Substituted {
    pub text: String,
    pub errors: Vec<ScriptError>,
}

//=============================================
//            Section 1: Variable Substitution
//=============================================

//Function: substitute
//Purpose: Replace bare identifiers and `${name}` interpolation markers
//Inputs: line: &str, vars: &VariableStore
//Returns: Substituted
pub fn substitute(line: &str, vars: &VariableStore) -> Substituted {
    let chars: Vec<char> = line.chars().collect();
    let mut text = String::with_capacity(line.len());
    let mut errors = Vec::new();
    let mut word = String::new();
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if in_string {
            match ch {
                '\\' => {
                    text.push(ch);
                    if let Some(&next) = chars.get(i + 1) {
                        text.push(next);
                        i += 1;
                    }
                }
                '$' if chars.get(i + 1) == Some(&'{') => {
                    let mut name = String::new();
                    let mut j = i + 2;
                    while j < chars.len() && chars[j] != '}' {
                        name.push(chars[j]);
                        j += 1;
                    }
                    if j == chars.len() {
                        errors.push(ScriptError::syntax(format!(
                            "Unterminated string interpolation sequence starting at '${{{name}'"
                        )));
                        text.push_str("${");
                        text.push_str(&name);
                        break;
                    }
                    text.push_str(&interpolate(name.trim(), vars, &mut errors));
                    i = j;
                }
                '"' => {
                    in_string = false;
                    text.push(ch);
                }
                _ => text.push(ch),
            }
            i += 1;
            continue;
        }

        if is_word_char(ch) {
            word.push(ch);
        } else {
            flush_word(&mut word, &mut text, vars, &mut errors);
            if ch == '"' {
                in_string = true;
            }
            text.push(ch);
        }
        i += 1;
    }
    flush_word(&mut word, &mut text, vars, &mut errors);

    Substituted { text, errors }
}

fn flush_word(
    word: &mut String,
    text: &mut String,
    vars: &VariableStore,
    errors: &mut Vec<ScriptError>,
) {
    if word.is_empty() {
        return;
    }
    let starts_like_name = word
        .chars()
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_');

    if !starts_like_name || is_reserved(word) {
        text.push_str(word);
    } else {
        match lookup(word, vars) {
            Ok(value) => text.push_str(&value.literal()),
            Err(error) => {
                errors.push(error);
                text.push('0');
            }
        }
    }
    word.clear();
}

fn interpolate(name: &str, vars: &VariableStore, errors: &mut Vec<ScriptError>) -> String {
    match lookup(name, vars) {
        Ok(Value::String(contents)) => escape_string(contents),
        Ok(other) => other.literal(),
        Err(error) => {
            errors.push(ScriptError::substitution(format!(
                "{} used in interpolation.",
                error.message
            )));
            "0".to_string()
        }
    }
}

fn lookup<'a>(name: &str, vars: &'a VariableStore) -> Result<&'a Value, ScriptError> {
    match vars.get(name) {
        Some(var) => var.value.as_ref().ok_or_else(|| {
            ScriptError::substitution(format!("Variable '{name}' has no value"))
        }),
        None => Err(ScriptError::substitution(format!(
            "Undefined variable '{name}'"
        ))),
    }
}

//=============================================
//            Section 2: Input Stage
//=============================================

//Function: handle_input
//Purpose: Replace each bare `input` keyword with one quoted line of input
//Inputs: line: &str, input: &mut dyn InputSource
//Returns: String
pub fn handle_input(line: &str, input: &mut dyn InputSource) -> String {
    let chars: Vec<char> = line.chars().collect();
    let keyword: Vec<char> = INPUT_KEYWORD.chars().collect();
    let mut processed = String::with_capacity(line.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if in_string {
            processed.push(ch);
            if ch == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    processed.push(next);
                    i += 1;
                }
            } else if ch == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if ch == '"' {
            in_string = true;
            processed.push(ch);
            i += 1;
            continue;
        }

        let matches_keyword = chars[i..].starts_with(&keyword);
        let standalone = matches_keyword
            && (i == 0 || !is_word_char(chars[i - 1]))
            && chars
                .get(i + keyword.len())
                .is_none_or(|&next| !is_word_char(next));

        if standalone {
            let received = input.read_line();
            processed.push('"');
            processed.push_str(&escape_string(&received));
            processed.push('"');
            i += keyword.len();
        } else {
            processed.push(ch);
            i += 1;
        }
    }

    processed
}
