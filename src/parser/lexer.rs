//! Lexer (tokenizer) for the expression language
//!
//! Produces one [`Token`] per call to [`Lexer::next_token`]; the parser pulls
//! tokens on demand and keeps exactly one of them as lookahead.
//!
//! There is no lexical error kind. Anything that is not whitespace, a comment,
//! an identifier or a number comes back as a [`Token::Symbol`], and malformed
//! numbers such as `1.2.3` are accepted with a recorded [`LexAmbiguity`].

use super::ast::SourceLocation;
use std::fmt;

/// All token variants produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    EndOfInput,

    // Keywords
    Def,
    Extern,
    If,
    Then,
    Else,

    Identifier(String),
    Number(f64),

    /// Any other single character: operators and punctuation
    Symbol(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::EndOfInput => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::If => write!(f, "'if'"),
            Token::Then => write!(f, "'then'"),
            Token::Else => write!(f, "'else'"),
            Token::Identifier(s) => write!(f, "identifier '{}'", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Symbol(c) => write!(f, "'{}'", c.escape_default()),
        }
    }
}

/// A numeric literal that did not convert cleanly.
///
/// The literal is still accepted: its value is the longest prefix that
/// parses as a float, or `0.0` when no prefix does.
#[derive(Debug, Clone, PartialEq)]
pub struct LexAmbiguity {
    pub text: String,
    pub value: f64,
    pub location: SourceLocation,
}

impl fmt::Display for LexAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ambiguous number literal '{}' at line {}, column {} read as {}",
            self.text, self.location.line, self.location.column, self.value
        )
    }
}

/// On-demand lexer over an in-memory source buffer
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    token_start: SourceLocation,
    ambiguities: Vec<LexAmbiguity>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            token_start: SourceLocation::new(1, 1),
            ambiguities: Vec::new(),
        }
    }

    /// Tokenize the entire input, `EndOfInput` included
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::EndOfInput;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    /// Get next token. Returns `EndOfInput` forever once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            if self.peek() != Some('#') {
                break;
            }
            self.skip_line_comment();
        }

        self.token_start = self.current_location();
        let Some(ch) = self.advance() else {
            return Token::EndOfInput;
        };

        if ch.is_ascii_alphabetic() {
            return self.identifier_or_keyword(ch);
        }

        if ch.is_ascii_digit() || ch == '.' {
            return self.number_literal(ch);
        }

        Token::Symbol(ch)
    }

    /// Location of the first character of the most recently returned token
    pub fn token_start(&self) -> SourceLocation {
        self.token_start
    }

    /// Malformed numbers seen so far
    pub fn ambiguities(&self) -> &[LexAmbiguity] {
        &self.ambiguities
    }

    /// Take the recorded ambiguities, leaving the list empty
    pub fn take_ambiguities(&mut self) -> Vec<LexAmbiguity> {
        std::mem::take(&mut self.ambiguities)
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "def" => Token::Def,
            "extern" => Token::Extern,
            "if" => Token::If,
            "then" => Token::Then,
            "else" => Token::Else,
            _ => Token::Identifier(ident),
        }
    }

    /// Parse a run of digits and dots
    fn number_literal(&mut self, first: char) -> Token {
        let mut num_str = String::new();
        num_str.push(first);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '.' {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match num_str.parse::<f64>() {
            Ok(value) => Token::Number(value),
            Err(_) => {
                let value = longest_float_prefix(&num_str);
                self.ambiguities.push(LexAmbiguity {
                    text: num_str,
                    value,
                    location: self.token_start,
                });
                Token::Number(value)
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\n' | '\t' | '\r') = self.peek() {
            self.advance();
        }
    }

    /// Skip a `#` comment up to and including the line break
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' || ch == '\r' {
                break;
            }
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Value of the longest prefix of `text` that parses as a float, like C's
/// `strtod`. `text` holds only ASCII digits and dots.
fn longest_float_prefix(text: &str) -> f64 {
    (1..=text.len())
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}
