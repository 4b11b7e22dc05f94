//! # Introduction
//!
//! kaleidoc compiles Kaleidoscope, a tiny expression language whose only type
//! is the 64-bit float, into an SSA intermediate representation and can run
//! the result right away.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → CodeGenerator → IrBuilder → Interpreter
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds one AST item per
//!    top-level form, driven by a configurable
//!    [`parser::precedence::PrecedenceTable`].
//! 2. [`codegen`]: lowers functions through the [`ir::IrBuilder`] trait,
//!    rolling back any function that fails.
//! 3. [`ir`]: the reference backend, an in-memory [`ir::module::Module`]
//!    with a verifier, a textual printer and an interpreter that links
//!    `extern` declarations against host functions.
//! 4. [`session`]: the driver loop tying the stages together.
//!
//! ## Language
//!
//! ```text
//! # Compute the x'th fibonacci number.
//! def fib(x)
//!   if x < 3 then
//!     1
//!   else
//!     fib(x-1)+fib(x-2)
//!
//! fib(10)
//! ```
//!
//! Forms: `def` definitions, `extern` declarations and top-level
//! expressions. Operators: `<`, `+`, `-` and `*`, plus `if/then/else`.

pub mod codegen;
pub mod error;
pub mod ir;
pub mod parser;
pub mod session;

pub use error::{Error, Result};
pub use session::{Outcome, Session, SessionConfig};
