//! Handles and values of the reference IR

use std::fmt;

/// Slot of a function in its [`Module`](super::module::Module)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub(crate) usize);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

/// A basic block: owning function plus position in its block list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    pub function: FunctionId,
    pub index: usize,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:bb{}", self.function, self.index)
    }
}

/// Index into a function's instruction arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstId(pub(crate) usize);

impl InstId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An SSA value, always of type `double`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Floating-point constant
    Const(f64),
    /// Formal parameter of the enclosing function, by position
    Param(usize),
    /// Result of an instruction of the enclosing function
    Inst(InstId),
}
