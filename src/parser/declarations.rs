//! Declaration parsing implementation
//!
//! ```text
//! prototype   ::= identifier "(" identifier* ")"
//! extern_decl ::= "extern" prototype
//! definition  ::= "def" prototype expression
//! toplevel    ::= expression
//! ```
//!
//! Parameters are bare identifiers with no separating commas.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser<'_> {
    /// Parse `name(a b c)`
    pub(crate) fn parse_prototype(&mut self) -> Result<Prototype, ParseError> {
        let name = self.expect_identifier("Expected function name in prototype")?;
        self.expect_symbol('(', "Expected '(' in prototype")?;

        let mut params = Vec::new();
        while let Token::Identifier(_) = self.current {
            if let Token::Identifier(param) = self.advance() {
                params.push(param);
            }
        }

        self.expect_symbol(')', "Expected ')' to end prototype")?;

        Ok(Prototype::new(name, params))
    }

    /// Parse `def prototype body`
    pub(crate) fn parse_definition(&mut self) -> Result<FunctionDef, ParseError> {
        self.advance(); // eat 'def'
        let prototype = self.parse_prototype()?;
        let body = self.parse_expression()?;
        Ok(FunctionDef { prototype, body })
    }

    /// Parse `extern prototype`
    pub(crate) fn parse_extern(&mut self) -> Result<Prototype, ParseError> {
        self.advance(); // eat 'extern'
        self.parse_prototype()
    }

    /// Wrap a bare expression into an anonymous zero-parameter function
    pub(crate) fn parse_top_level_expr(&mut self) -> Result<FunctionDef, ParseError> {
        let body = self.parse_expression()?;
        Ok(FunctionDef::anonymous(body))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;
    use crate::parser::precedence::PrecedenceTable;

    #[test]
    fn test_prototype_without_params() {
        let table = PrecedenceTable::default();
        let mut parser = Parser::new("extern rand()", &table);
        let proto = parser.parse_extern().unwrap();
        assert_eq!(proto, Prototype::new("rand", vec![]));
    }

    #[test]
    fn test_prototype_rejects_commas() {
        let table = PrecedenceTable::default();
        let mut parser = Parser::new("def f(a, b) a", &table);
        let err = parser.parse_definition().unwrap_err();
        assert!(err.message.starts_with("Expected ')' to end prototype"));
    }

    #[test]
    fn test_prototype_requires_paren() {
        let table = PrecedenceTable::default();
        let mut parser = Parser::new("extern sin x", &table);
        let err = parser.parse_extern().unwrap_err();
        assert!(err.message.starts_with("Expected '(' in prototype"));
    }

    #[test]
    fn test_definition_body_spans_lines() {
        let table = PrecedenceTable::default();
        let mut parser = Parser::new("def f(x)\n\n  x *\n 2", &table);
        let def = parser.parse_definition().unwrap();
        assert_eq!(def.body.to_string(), "(x*2)");
    }

    #[test]
    fn test_top_level_expression_is_anonymous() {
        let table = PrecedenceTable::default();
        let mut parser = Parser::new("1+2", &table);
        let def = parser.parse_top_level_expr().unwrap();
        assert_eq!(def.prototype.name, ANON_EXPR_NAME);
        assert!(def.prototype.params.is_empty());
    }
}
