//=============================================
// src/interpreter/statement.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Line grammar for snx statements
// Objective: Classify one source line into a statement for the engine, with
//            block-sensitive grammars selected by the active block style
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::substitution::is_reserved;

//=============================================
//            Section 2: Block Styles
//=============================================

/// Block delimiter convention for `if` and `func` bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum BlockStyle {
    /// Bodies close with a bare `end` line.
    #[default]
    #[serde(rename = "end")]
    EndKeyword,
    /// Headers end with `{` and bodies close with a bare `}` line.
    #[serde(rename = "brackets")]
    BraceDelimited,
}

impl BlockStyle {
    pub fn name(self) -> &'static str {
        match self {
            BlockStyle::EndKeyword => "end",
            BlockStyle::BraceDelimited => "brackets",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "end" => Some(BlockStyle::EndKeyword),
            "brackets" => Some(BlockStyle::BraceDelimited),
            _ => None,
        }
    }

    pub(crate) fn grammar(self) -> &'static Grammar {
        match self {
            BlockStyle::EndKeyword => &END_GRAMMAR,
            BlockStyle::BraceDelimited => &BRACE_GRAMMAR,
        }
    }
}

impl fmt::Display for BlockStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockStyle::from_name(s)
            .ok_or_else(|| format!("unknown block style '{s}' (expected 'end' or 'brackets')"))
    }
}

//=============================================
//            Section 3: Grammar Tables
//=============================================

/// The style-dependent part of the statement grammar.
pub(crate) struct Grammar {
    pub(crate) if_header: Regex,
    pub(crate) function_header: Regex,
    pub(crate) close_block: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid statement pattern {pattern}: {err}"))
}

static END_GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    if_header: compile(r"^\s*if\s+(.*?)\s*$"),
    function_header: compile(r"^\s*func\s+([A-Za-z_]\w*)\s*\((.*)\)\s*$"),
    close_block: compile(r"^\s*end\s*$"),
});

static BRACE_GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    if_header: compile(r"^\s*if\s+(.*?)\s*\{\s*$"),
    function_header: compile(r"^\s*func\s+([A-Za-z_]\w*)\s*\((.*)\)\s*\{\s*$"),
    close_block: compile(r"^\s*\}\s*$"),
});

static STYLE_RE: Lazy<Regex> = Lazy::new(|| compile(r#"^\s*STYLE\s*=\s*["']?([A-Za-z]+)["']?\s*$"#));
static END_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*END\s*$"));
static GOTO_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*GOTO\s+(\S+)\s*$"));
static RETURN_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*return\s*;?\s*$"));
static RETURN_EXPR_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*return\s+(.+?)\s*;?\s*$"));
static CALL_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*([A-Za-z_]\w*)\s*\((.*)\)\s*$"));
static VAR_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*var\s+([A-Za-z_]\w*)\s*=(.*)$"));
static ASSIGN_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*([A-Za-z_]\w*)\s*=(.*)$"));
static PRINTLN_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*println\s+(.*)$"));
static PRINT_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*print\s+(.*)$"));
static EXEC_RE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*exec\s+(.*)$"));

//=============================================
//            Section 4: Statements
//=============================================

/// One classified source line. Slices borrow from the line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    Style(&'a str),
    Blank,
    Comment,
    End,
    CloseBlock,
    Goto(&'a str),
    Return { expression: Option<&'a str> },
    FunctionHeader { name: &'a str, parameters: Vec<&'a str> },
    Call { name: &'a str, arguments: Vec<&'a str> },
    If { condition: &'a str },
    Declaration { name: &'a str, expression: &'a str },
    Assignment { name: &'a str, expression: &'a str },
    Print { expression: &'a str, newline: bool },
    Exec { expression: &'a str },
    Unrecognized,
}

impl<'a> Statement<'a> {
    //Function: parse
    //Purpose: Match a line against the statement grammars in priority order
    //Inputs: line: &'a str, style: BlockStyle
    //Returns: Statement<'a>
    pub fn parse(line: &'a str, style: BlockStyle) -> Self {
        let grammar = style.grammar();
        let trimmed = line.trim();

        if let Some(caps) = STYLE_RE.captures(line) {
            return Statement::Style(group(&caps, 1, line));
        }
        if trimmed.is_empty() {
            return Statement::Blank;
        }
        if trimmed.starts_with('#') {
            return Statement::Comment;
        }
        if END_RE.is_match(line) {
            return Statement::End;
        }
        if grammar.close_block.is_match(line) {
            return Statement::CloseBlock;
        }
        if let Some(caps) = GOTO_RE.captures(line) {
            return Statement::Goto(group(&caps, 1, line));
        }
        if RETURN_RE.is_match(line) {
            return Statement::Return { expression: None };
        }
        if let Some(caps) = RETURN_EXPR_RE.captures(line) {
            return Statement::Return {
                expression: Some(group(&caps, 1, line)),
            };
        }
        if let Some(caps) = grammar.function_header.captures(line) {
            return Statement::FunctionHeader {
                name: group(&caps, 1, line),
                parameters: split_arguments(group(&caps, 2, line)),
            };
        }
        if let Some(caps) = CALL_RE.captures(line) {
            let name = group(&caps, 1, line);
            if !is_reserved(name) {
                return Statement::Call {
                    name,
                    arguments: split_arguments(group(&caps, 2, line)),
                };
            }
        }
        if let Some(caps) = grammar.if_header.captures(line) {
            return Statement::If {
                condition: group(&caps, 1, line).trim(),
            };
        }
        if let Some(caps) = VAR_RE.captures(line) {
            return Statement::Declaration {
                name: group(&caps, 1, line),
                expression: group(&caps, 2, line).trim(),
            };
        }
        if let Some(caps) = ASSIGN_RE.captures(line) {
            let rest = group(&caps, 2, line);
            // `x == 1` is a comparison, not an assignment
            if !rest.starts_with('=') {
                return Statement::Assignment {
                    name: group(&caps, 1, line),
                    expression: rest.trim(),
                };
            }
        }
        if let Some(caps) = PRINTLN_RE.captures(line) {
            return Statement::Print {
                expression: group(&caps, 1, line).trim(),
                newline: true,
            };
        }
        if let Some(caps) = PRINT_RE.captures(line) {
            return Statement::Print {
                expression: group(&caps, 1, line).trim(),
                newline: false,
            };
        }
        if let Some(caps) = EXEC_RE.captures(line) {
            return Statement::Exec {
                expression: group(&caps, 1, line).trim(),
            };
        }

        Statement::Unrecognized
    }

    /// Control statements are dispatched without the input stage running.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Statement::Style(_)
                | Statement::Blank
                | Statement::Comment
                | Statement::End
                | Statement::CloseBlock
                | Statement::Goto(_)
                | Statement::Return { .. }
                | Statement::FunctionHeader { .. }
        )
    }
}

/// True when `line` opens a block under `style` (an `if` or `func` header).
pub fn opens_block(line: &str, style: BlockStyle) -> bool {
    let grammar = style.grammar();
    grammar.if_header.is_match(line) || grammar.function_header.is_match(line)
}

/// True when `line` is the block-close marker of `style`.
pub fn closes_block(line: &str, style: BlockStyle) -> bool {
    style.grammar().close_block.is_match(line)
}

fn group<'a>(caps: &regex::Captures<'a>, index: usize, line: &'a str) -> &'a str {
    caps.get(index)
        .map(|m| m.as_str())
        .unwrap_or(&line[line.len()..])
}

//Function: split_arguments
//Purpose: Split a comma-separated list at top level, trimming each entry
//Inputs: list: &str
//Returns: Vec<&str>
pub fn split_arguments(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in list.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(list[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}
