use thiserror::Error;

use crate::{codegen::CodegenError, ir::interp::ExecError, parser::parse::ParseError};

/// Any failure of a single top-level form
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

pub type Result<T> = std::result::Result<T, Error>;
