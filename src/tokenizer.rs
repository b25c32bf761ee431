use std::fmt;

use crate::interpreter::errors::ScriptError;

/// Operators understood by the expression evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    And,
    Or,
    EqualEqual,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Not => "!",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::EqualEqual => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Not)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Token categories. Numerals keep their raw lexeme (including a fused sign);
/// whether they are int or float is decided when they are evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(String),
    Boolean(bool),
    String(String),
    Operator(Operator),
    LeftParen,
    RightParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => f.write_str(n),
            TokenKind::Boolean(b) => write!(f, "{b}"),
            TokenKind::String(s) => write!(f, "\"{s}\""),
            TokenKind::Operator(op) => write!(f, "{op}"),
            TokenKind::LeftParen => f.write_str("("),
            TokenKind::RightParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the first character of the token.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Tokenizer for a single expression. Identifiers are expected to have been
/// replaced by literals before this runs, so only `true`/`false` are words.
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ScriptError> {
        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_whitespace() {
                self.advance();
                continue;
            }

            match ch {
                '(' => self.emit_single(TokenKind::LeftParen),
                ')' => self.emit_single(TokenKind::RightParen),
                '*' => self.emit_single(TokenKind::Operator(Operator::Star)),
                '/' => self.emit_single(TokenKind::Operator(Operator::Slash)),
                '%' => self.emit_single(TokenKind::Operator(Operator::Percent)),
                '+' | '-' => self.handle_sign(),
                '=' | '!' | '<' | '>' | '&' | '|' => self.handle_comparison_or_logic()?,
                '"' => self.handle_string()?,
                c if c.is_ascii_digit() || c == '.' => self.handle_number(),
                c if c.is_alphabetic() || c == '_' => self.handle_word()?,
                other => {
                    return Err(ScriptError::syntax(format!(
                        "Invalid character '{}' at column {}",
                        other,
                        self.position + 1
                    )));
                }
            }
        }

        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.current_char();
        self.position += 1;
        ch
    }

    fn emit_single(&mut self, kind: TokenKind) {
        let offset = self.position;
        self.advance();
        self.tokens.push(Token::new(kind, offset));
    }

    /// A sign is fused into the following numeral at expression start, after
    /// `(`, or after another operator.
    fn in_unary_position(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(token) => matches!(token.kind, TokenKind::LeftParen | TokenKind::Operator(_)),
        }
    }

    fn handle_sign(&mut self) {
        let starts_numeral = self
            .peek_char()
            .is_some_and(|next| next.is_ascii_digit() || next == '.');

        if self.in_unary_position() && starts_numeral {
            let offset = self.position;
            let mut numeral = String::new();
            numeral.push(self.advance());
            self.collect_digits(&mut numeral);
            self.tokens.push(Token::new(TokenKind::Number(numeral), offset));
        } else {
            let op = if self.current_char() == '+' {
                Operator::Plus
            } else {
                Operator::Minus
            };
            self.emit_single(TokenKind::Operator(op));
        }
    }

    fn handle_number(&mut self) {
        let offset = self.position;
        let mut numeral = String::new();
        self.collect_digits(&mut numeral);
        self.tokens.push(Token::new(TokenKind::Number(numeral), offset));
    }

    // Malformed numerals such as `1.2.3` are left for the numeric parse.
    fn collect_digits(&mut self, numeral: &mut String) {
        while !self.is_at_end()
            && (self.current_char().is_ascii_digit() || self.current_char() == '.')
        {
            numeral.push(self.advance());
        }
    }

    fn handle_comparison_or_logic(&mut self) -> Result<(), ScriptError> {
        let offset = self.position;
        let ch = self.advance();
        let next = self.current_char();

        let op = match (ch, next) {
            ('=', '=') => Some(Operator::EqualEqual),
            ('!', '=') => Some(Operator::NotEqual),
            ('<', '=') => Some(Operator::LessEqual),
            ('>', '=') => Some(Operator::GreaterEqual),
            ('&', '&') => Some(Operator::And),
            ('|', '|') => Some(Operator::Or),
            _ => None,
        };

        let op = match op {
            Some(op) => {
                self.advance();
                op
            }
            None => match ch {
                '!' => Operator::Not,
                '<' => Operator::Less,
                '>' => Operator::Greater,
                other => {
                    return Err(ScriptError::syntax(format!(
                        "Unexpected character '{}' at column {}",
                        other,
                        offset + 1
                    )));
                }
            },
        };

        self.tokens.push(Token::new(TokenKind::Operator(op), offset));
        Ok(())
    }

    fn handle_string(&mut self) -> Result<(), ScriptError> {
        let offset = self.position;
        self.advance(); // opening quote

        let mut contents = String::new();
        loop {
            if self.is_at_end() {
                return Err(ScriptError::syntax("Unterminated string"));
            }
            match self.advance() {
                '"' => break,
                '\\' => {
                    if self.is_at_end() {
                        return Err(ScriptError::syntax("Unterminated string"));
                    }
                    contents.push(self.advance());
                }
                other => contents.push(other),
            }
        }

        self.tokens.push(Token::new(TokenKind::String(contents), offset));
        Ok(())
    }

    fn handle_word(&mut self) -> Result<(), ScriptError> {
        let offset = self.position;
        let mut word = String::new();
        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            word.push(self.advance());
        }

        let kind = match word.as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => {
                return Err(ScriptError::syntax(format!(
                    "Unknown identifier '{word}'"
                )));
            }
        };
        self.tokens.push(Token::new(kind, offset));
        Ok(())
    }
}

/// Convenience wrapper used by the parser.
pub fn tokenize(expr: &str) -> Result<Vec<Token>, ScriptError> {
    Tokenizer::new(expr).tokenize()
}
