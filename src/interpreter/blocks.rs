//=============================================
// src/interpreter/blocks.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Block boundary scanning
// Objective: Locate the close marker matching an `if` or `func` header
//            without touching the program cursor
//=============================================

use crate::interpreter::errors::ScriptError;
use crate::interpreter::statement::{BlockStyle, closes_block, opens_block};
use crate::source::SourceLines;

//Function: find_block_end
//Purpose: Scan forward from the first body line to the matching close marker
//Inputs: source: &SourceLines, body_start: usize, style: BlockStyle
//Returns: Result<usize, ScriptError> with the line number of the close marker
pub fn find_block_end(
    source: &SourceLines,
    body_start: usize,
    style: BlockStyle,
) -> Result<usize, ScriptError> {
    let mut depth: usize = 1;

    for number in body_start..=source.len() {
        let Some(line) = source.line(number) else {
            continue;
        };
        match style {
            BlockStyle::BraceDelimited => {
                for ch in line.chars() {
                    match ch {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return Ok(number);
                            }
                        }
                        _ => {}
                    }
                }
            }
            BlockStyle::EndKeyword => {
                if opens_block(line, style) {
                    depth += 1;
                } else if closes_block(line, style) {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(number);
                    }
                }
            }
        }
    }

    Err(ScriptError::syntax(format!(
        "Unmatched block opened before line {body_start}: no closing '{}' found",
        match style {
            BlockStyle::EndKeyword => "end",
            BlockStyle::BraceDelimited => "}",
        }
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_style_skips_nested_headers() {
        let source = SourceLines::from_text(
            "if false\n  if true\n    print 1\n  end\n  func f()\n  end\nend\nprint 2",
        );
        assert_eq!(find_block_end(&source, 2, BlockStyle::EndKeyword), Ok(7));
        assert_eq!(find_block_end(&source, 3, BlockStyle::EndKeyword), Ok(4));
    }

    #[test]
    fn brace_style_counts_every_brace() {
        let source = SourceLines::from_text("if x {\n  if y {\n  }\n}\nprint 1");
        assert_eq!(find_block_end(&source, 2, BlockStyle::BraceDelimited), Ok(4));
    }

    #[test]
    fn missing_close_is_a_syntax_error() {
        let source = SourceLines::from_text("func f()\n  print 1");
        let err = find_block_end(&source, 2, BlockStyle::EndKeyword).unwrap_err();
        assert_eq!(err.code_str(), "E001");
    }
}
