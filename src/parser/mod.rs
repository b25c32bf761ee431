//=============================================
// src/parser/mod.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Operator-precedence parser for snx expressions
// Objective: Reorder infix token streams into postfix order for the evaluator
// Formatting: Zobie.format (.solvraformat)
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use crate::interpreter::errors::ScriptError;
use crate::tokenizer::{Operator, Token, TokenKind};

//=============================================
//            Section 2: Precedence Table
//=============================================

//Function: precedence
//Purpose: Binding strength of each operator, higher binds tighter
//Inputs: op: Operator
//Returns: u8
pub fn precedence(op: Operator) -> u8 {
    match op {
        Operator::Or => 1,
        Operator::And => 2,
        Operator::EqualEqual | Operator::NotEqual => 3,
        Operator::Less | Operator::Greater | Operator::LessEqual | Operator::GreaterEqual => 4,
        Operator::Plus | Operator::Minus => 5,
        Operator::Star | Operator::Slash | Operator::Percent => 6,
        Operator::Not => 7,
    }
}

//=============================================
//            Section 3: Parser State
//=============================================

/// Stack entries: either a pending operator or an open parenthesis marker.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Operator(Operator),
    Paren,
}

/// Shunting-Yard converter from infix tokens to postfix tokens.
pub struct Parser {
    tokens: Vec<Token>,
    output: Vec<Token>,
    stack: Vec<(Pending, usize)>,
}

impl Parser {
    //Function: new
    //Purpose: Initialize parser with an infix token stream
    //Inputs: tokens: Vec<Token>
    //Returns: Self
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            output: Vec::new(),
            stack: Vec::new(),
        }
    }

    //=============================================
    //            Section 4: Conversion
    //=============================================

    //Function: to_postfix
    //Purpose: Run the Shunting-Yard algorithm over the token stream
    //Inputs: self
    //Returns: Result<Vec<Token>, ScriptError>
    pub fn to_postfix(mut self) -> Result<Vec<Token>, ScriptError> {
        let tokens = std::mem::take(&mut self.tokens);

        for token in tokens {
            match token.kind {
                TokenKind::Number(_) | TokenKind::Boolean(_) | TokenKind::String(_) => {
                    self.output.push(token);
                }
                TokenKind::LeftParen => self.stack.push((Pending::Paren, token.offset)),
                TokenKind::RightParen => self.close_paren()?,
                TokenKind::Operator(op) => self.push_operator(op, token.offset),
            }
        }

        while let Some((pending, offset)) = self.stack.pop() {
            match pending {
                Pending::Paren => {
                    return Err(ScriptError::syntax("Mismatched parentheses"));
                }
                Pending::Operator(op) => self.emit(op, offset),
            }
        }

        Ok(self.output)
    }

    fn close_paren(&mut self) -> Result<(), ScriptError> {
        loop {
            match self.stack.pop() {
                Some((Pending::Paren, _)) => return Ok(()),
                Some((Pending::Operator(op), offset)) => self.emit(op, offset),
                None => return Err(ScriptError::syntax("Mismatched parentheses")),
            }
        }
    }

    // Binary operators are left associative. A prefix `!` has no left operand
    // yet, so it never pops anything when pushed.
    fn push_operator(&mut self, op: Operator, offset: usize) {
        if !op.is_unary() {
            while let Some(&(Pending::Operator(top), top_offset)) = self.stack.last() {
                if precedence(top) < precedence(op) {
                    break;
                }
                self.stack.pop();
                self.emit(top, top_offset);
            }
        }
        self.stack.push((Pending::Operator(op), offset));
    }

    fn emit(&mut self, op: Operator, offset: usize) {
        self.output.push(Token::new(TokenKind::Operator(op), offset));
    }
}

//Function: parse_postfix
//Purpose: Tokenize an expression string and return its postfix form
//Inputs: expr: &str
//Returns: Result<Vec<Token>, ScriptError>
pub fn parse_postfix(expr: &str) -> Result<Vec<Token>, ScriptError> {
    let tokens = crate::tokenizer::tokenize(expr)?;
    Parser::new(tokens).to_postfix()
}
