//! Expression parsing implementation
//!
//! Primary expressions are parsed by recursive descent; binary operators use
//! precedence climbing over the parser's [`PrecedenceTable`].
//!
//! # Grammar
//!
//! ```text
//! expression     ::= primary (binop primary)*
//! primary        ::= identifierexpr | number | parenexpr | ifexpr
//! identifierexpr ::= identifier | identifier "(" (expression ("," expression)*)? ")"
//! parenexpr      ::= "(" expression ")"
//! ifexpr         ::= "if" expression "then" expression "else" expression
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.
//!
//! [`PrecedenceTable`]: crate::parser::precedence::PrecedenceTable

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser<'_> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_primary()?;
        self.parse_bin_op_rhs(0, lhs)
    }

    /// Precedence climbing: fold `(op primary)*` into `lhs` for every operator
    /// binding at least as tightly as `min_precedence`.
    ///
    /// Equal precedence groups to the left; a tighter operator after the
    /// right operand is absorbed into it by recursing with a higher minimum.
    pub(crate) fn parse_bin_op_rhs(
        &mut self,
        min_precedence: i32,
        mut lhs: Expr,
    ) -> Result<Expr, ParseError> {
        loop {
            let (op, precedence) = match self.current_binary_op() {
                Some((op, precedence)) if precedence >= min_precedence => (op, precedence),
                _ => return Ok(lhs),
            };
            self.advance(); // eat operator

            let mut rhs = self.parse_primary()?;

            // a right operand absorbing tighter operators nests one level
            if precedence < self.current_precedence() {
                self.depth += 1;
                let absorbed = self.parse_bin_op_rhs(precedence + 1, rhs);
                self.depth -= 1;
                rhs = absorbed?;
            }

            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    /// Parse primary expression, refusing to nest past [`MAX_EXPR_DEPTH`]
    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(self.error(format!(
                "Expression nesting exceeds the limit of {} levels",
                MAX_EXPR_DEPTH
            )));
        }

        self.depth += 1;
        let result = match self.current {
            Token::Identifier(_) => self.parse_identifier_expr(),
            Token::Number(_) => self.parse_number_expr(),
            Token::Symbol('(') => self.parse_paren_expr(),
            Token::If => self.parse_if_expr(),
            _ => Err(self.unexpected("Expected expression")),
        };
        self.depth -= 1;

        result
    }

    fn parse_number_expr(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Number(value) => Ok(Expr::Number(value)),
            other => Err(self.error(format!("Expected number, found {}", other))),
        }
    }

    /// Parse `( expression )`
    fn parse_paren_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance(); // eat '('
        let expr = self.parse_expression()?;
        self.expect_symbol(')', "Expected ')' to close parenthesized expression")?;
        Ok(expr)
    }

    /// Parse a variable reference or a call
    fn parse_identifier_expr(&mut self) -> Result<Expr, ParseError> {
        let name = self.expect_identifier("Expected identifier")?;

        if !self.check_symbol('(') {
            return Ok(Expr::Variable(name));
        }
        self.advance(); // eat '('

        let mut args = Vec::new();
        if !self.check_symbol(')') {
            loop {
                args.push(self.parse_expression()?);

                if self.check_symbol(')') {
                    break;
                }
                self.expect_symbol(',', "Expected ')' or ',' in argument list")?;
            }
        }
        self.advance(); // eat ')'

        Ok(Expr::Call { callee: name, args })
    }

    /// Parse `if cond then a else b`
    fn parse_if_expr(&mut self) -> Result<Expr, ParseError> {
        self.advance(); // eat 'if'
        let condition = self.parse_expression()?;

        self.expect_token(&Token::Then, "Expected 'then' after if condition")?;
        let then_branch = self.parse_expression()?;

        self.expect_token(&Token::Else, "Expected 'else' after then branch")?;
        let else_branch = self.parse_expression()?;

        Ok(Expr::if_else(condition, then_branch, else_branch))
    }
}
