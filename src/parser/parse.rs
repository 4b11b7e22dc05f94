//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, helper methods, and the top-level driver loop.
//!
//! # Parser Architecture
//!
//! - This module: Parser struct, helper methods, top-level loop and recovery
//! - `declarations`: `def`, `extern` and bare top-level expressions
//! - `expressions`: primary expressions and precedence climbing
//!
//! # Error Recovery
//!
//! A parse failure only aborts the current top-level form. [`Parser::next_item`]
//! discards the offending token and the caller simply asks for the next item,
//! so a syntax error never ends the run.

use crate::parser::ast::*;
use crate::parser::lexer::{LexAmbiguity, Lexer, Token};
use crate::parser::precedence::PrecedenceTable;
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at line {}, column {}: {}", .location.line, .location.column, .message)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

/// Recursive descent parser with one token of lookahead
pub struct Parser<'a> {
    lexer: Lexer,
    pub(crate) current: Token,
    location: SourceLocation,
    pub(crate) precedence: &'a PrecedenceTable,
    pub(crate) depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &str, precedence: &'a PrecedenceTable) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let location = lexer.token_start();
        Self {
            lexer,
            current,
            location,
            precedence,
            depth: 0,
        }
    }

    /// Parse the whole input, collecting every form that parsed and every
    /// error that was recovered from
    pub fn parse_program(&mut self) -> (Program, Vec<ParseError>) {
        let mut program = Program::new();
        let mut errors = Vec::new();

        while let Some(item) = self.next_item() {
            match item {
                Ok(item) => program.items.push(item),
                Err(err) => errors.push(err),
            }
        }

        (program, errors)
    }

    /// Parse the next top-level form, or `None` once the input is exhausted.
    ///
    /// On error the offending token has already been discarded, so calling
    /// again resumes with the following form.
    pub fn next_item(&mut self) -> Option<Result<Item, ParseError>> {
        loop {
            self.depth = 0;
            let result = match self.current {
                Token::EndOfInput => return None,
                Token::Symbol(';') => {
                    self.advance();
                    continue;
                }
                Token::Def => self.parse_definition().map(Item::Function),
                Token::Extern => self.parse_extern().map(Item::Extern),
                _ => self.parse_top_level_expr().map(Item::TopLevelExpr),
            };

            if result.is_err() {
                self.advance();
            }
            return Some(result);
        }
    }

    /// Malformed numbers the lexer accepted since the last call
    pub fn take_ambiguities(&mut self) -> Vec<LexAmbiguity> {
        self.lexer.take_ambiguities()
    }

    // ===== Helper methods =====

    /// Move to the next token, returning the one that was current
    pub(crate) fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        self.location = self.lexer.token_start();
        std::mem::replace(&mut self.current, next)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.location
    }

    pub(crate) fn check_symbol(&self, symbol: char) -> bool {
        self.current == Token::Symbol(symbol)
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.current_location(),
        }
    }

    /// Error for an unexpected current token
    pub(crate) fn unexpected(&self, message: &str) -> ParseError {
        self.error(format!("{}, found {}", message, self.current))
    }

    pub(crate) fn expect_symbol(&mut self, symbol: char, message: &str) -> Result<(), ParseError> {
        if self.check_symbol(symbol) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(message))
        }
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if &self.current == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(message))
        }
    }

    pub(crate) fn expect_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        if let Token::Identifier(_) = self.current {
            if let Token::Identifier(name) = self.advance() {
                return Ok(name);
            }
        }
        Err(self.unexpected(message))
    }

    /// Precedence of the current token if it is a configured binary operator
    pub(crate) fn current_binary_op(&self) -> Option<(char, i32)> {
        match self.current {
            Token::Symbol(op) => self.precedence.get(op).map(|prec| (op, prec)),
            _ => None,
        }
    }

    /// Precedence of the current token, `-1` when it is not a binary operator
    pub(crate) fn current_precedence(&self) -> i32 {
        self.current_binary_op().map_or(-1, |(_, prec)| prec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Program, Vec<ParseError>) {
        let table = PrecedenceTable::default();
        let mut parser = Parser::new(source, &table);
        parser.parse_program()
    }

    #[test]
    fn test_parse_simple_function() {
        let (program, errors) = parse("def foo(a b) a+b;");
        assert!(errors.is_empty());
        assert_eq!(program.items.len(), 1);

        match &program.items[0] {
            Item::Function(def) => {
                assert_eq!(def.prototype.name, "foo");
                assert_eq!(def.prototype.params, vec!["a", "b"]);
                assert_eq!(def.body.to_string(), "(a+b)");
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_extern_and_top_level() {
        let (program, errors) = parse("extern sin(x); sin(1)");
        assert!(errors.is_empty());
        assert_eq!(
            program.items,
            vec![
                Item::Extern(Prototype::new("sin", vec!["x".to_string()])),
                Item::TopLevelExpr(FunctionDef::anonymous(Expr::call(
                    "sin",
                    vec![Expr::Number(1.0)]
                ))),
            ]
        );
    }

    #[test]
    fn test_duplicate_parameters_are_accepted() {
        let (program, errors) = parse("def f(x x) x");
        assert!(errors.is_empty());
        match &program.items[0] {
            Item::Function(def) => assert_eq!(def.prototype.params, vec!["x", "x"]),
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_recovery_after_error() {
        let (program, errors) = parse("def 1; def ok(y) y; 4");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Expected function name"));
        assert_eq!(errors[0].location, SourceLocation::new(1, 5));

        let names: Vec<String> = program
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Function(def) => Some(def.prototype.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["ok"]);
        assert!(matches!(program.items.last(), Some(Item::TopLevelExpr(_))));
    }

    #[test]
    fn test_error_at_end_of_input_terminates() {
        let (program, errors) = parse("def foo(");
        assert!(program.items.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("end of input"));
    }

    #[test]
    fn test_error_display() {
        let err = ParseError {
            message: "Expected ')'".to_string(),
            location: SourceLocation::new(3, 7),
        };
        assert_eq!(
            err.to_string(),
            "Parse error at line 3, column 7: Expected ')'"
        );
    }
}
