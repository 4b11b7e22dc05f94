//! Code generation error types
//!
//! This module defines [`CodegenError`], the reasons a function cannot be
//! lowered. Every codegen error aborts only the function being generated;
//! the partially built function is removed from the module before the error
//! is returned.

use crate::ir::{IrError, VerifyError};
use thiserror::Error;

/// Errors raised while lowering the AST
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// Reference to a name that is not a parameter of the enclosing function
    #[error("Unknown variable name '{name}'")]
    UndefinedVariable { name: String },

    /// Call to a function that was never defined or declared
    #[error("Unknown function referenced: '{name}'")]
    UndefinedFunction { name: String },

    #[error("Incorrect number of arguments passed to '{function}': expected {expected}, got {got}")]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid binary operator '{op}'")]
    UnsupportedOperator { op: char },

    /// The backend refused to declare the prototype
    #[error("Cannot declare function '{name}'")]
    MissingPrototype { name: String },

    /// Changing the arity of a declaration that existing functions call
    #[error("Function '{name}' is already called with {expected} arguments and cannot be redeclared with {got}")]
    SignatureConflict {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Function '{name}' cannot be redefined")]
    Redefinition { name: String },

    #[error("Function '{function}' failed verification: {message}")]
    VerificationFailure { function: String, message: String },

    /// Expression nesting too deep to lower
    #[error("Expression nesting exceeds the limit of {limit} levels")]
    TooDeep { limit: usize },

    #[error(transparent)]
    Ir(#[from] IrError),
}

impl From<VerifyError> for CodegenError {
    fn from(err: VerifyError) -> Self {
        CodegenError::VerificationFailure {
            function: err.function,
            message: err.message,
        }
    }
}
