//! Source text parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens, pulled one at a time)
//! - [`precedence`]: Binary operator precedence configuration
//! - [`parse`]: The [`Parser`](parse::Parser) struct and top-level driver loop
//! - [`ast`]: AST node definitions
//!
//! # Language
//!
//! The language has a single value type (`f64`) and no statements. A program
//! is a sequence of top-level forms:
//! - `def name(a b) expr` defines a function
//! - `extern name(a b)` declares a function without a body
//! - any other expression is evaluated immediately
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators, driven by a caller-supplied [`PrecedenceTable`](precedence::PrecedenceTable).
//! Exactly one token of lookahead, no backtracking.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod precedence;
