//! Error types of the reference IR backend

use super::types::{BlockId, FunctionId};
use thiserror::Error;

/// Misuse of the builder surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrError {
    #[error("No insertion point is set")]
    NoInsertionPoint,

    #[error("Function {0} does not exist")]
    UnknownFunction(FunctionId),

    #[error("Block {0} does not exist")]
    UnknownBlock(BlockId),
}

/// A function rejected by the verifier
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Function '{function}' is malformed: {message}")]
pub struct VerifyError {
    pub function: String,
    pub message: String,
}

impl VerifyError {
    pub fn new(function: impl Into<String>, message: impl Into<String>) -> Self {
        VerifyError {
            function: function.into(),
            message: message.into(),
        }
    }
}
