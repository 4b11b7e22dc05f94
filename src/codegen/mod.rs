//! Code generation
//!
//! This module lowers the AST onto any [`IrBuilder`](crate::ir::IrBuilder):
//! - [`engine`]: [`CodeGenerator`], prototypes and function definitions
//! - [`errors`]: [`CodegenError`]
//!
//! # Lowering Model
//!
//! Every value is a double. Each function gets a fresh [`Scope`] holding its
//! parameters and nothing else, so names never leak between functions. A
//! function that fails to lower, for any reason, is removed from the module
//! again, leaving only fully built functions and declarations behind.

pub mod engine;
pub mod errors;
mod expressions;

pub use engine::{CodeGenerator, Scope};
pub use errors::CodegenError;
