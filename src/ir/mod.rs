//! Intermediate representation
//!
//! The code generator only talks to the [`IrBuilder`] trait, the emission
//! surface a backend has to provide. This module also ships the reference
//! backend:
//! - [`module`]: [`Module`](module::Module), an in-memory SSA module implementing [`IrBuilder`]
//! - [`instr`] / [`types`]: instructions, values and handles
//! - [`verify`]: well-formedness checks run after each function is built
//! - [`printer`]: LLVM-flavoured textual dump of a module
//! - [`interp`]: executes functions, linking declarations to host functions
//!
//! # IR Model
//!
//! Every value is a `double`. A function is a list of basic blocks, each ending
//! in exactly one terminator (`br`, conditional `br` or `ret`); control-flow
//! joins select values with `phi`.

pub mod errors;
pub mod instr;
pub mod interp;
pub mod module;
pub mod printer;
pub mod types;
pub mod verify;

pub use errors::{IrError, VerifyError};
pub use instr::BinaryKind;

use std::fmt::Debug;

/// Instruction-emission surface consumed by the code generator
pub trait IrBuilder {
    type Value: Copy + Debug;
    type Function: Copy + PartialEq + Debug;
    type Block: Copy + PartialEq + Debug;

    /// Floating-point constant
    fn const_f64(&mut self, value: f64) -> Self::Value;

    fn binary(
        &mut self,
        kind: BinaryKind,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Result<Self::Value, IrError>;

    /// Look up `name`, or create a body-less function taking one double per
    /// parameter. Re-declaring a body-less function replaces its parameters.
    /// `None` when the backend cannot declare such a function.
    fn declare_function(&mut self, name: &str, params: &[String]) -> Option<Self::Function>;

    fn lookup_function(&self, name: &str) -> Option<Self::Function>;

    fn param_count(&self, function: Self::Function) -> usize;

    /// One value per formal parameter, in order
    fn param_values(&self, function: Self::Function) -> Vec<Self::Value>;

    /// Formal parameter names, in order
    fn param_names(&self, function: Self::Function) -> Vec<String>;

    fn has_body(&self, function: Self::Function) -> bool;

    /// Whether any function in the module contains a call to `function`
    fn has_callers(&self, function: Self::Function) -> bool;

    fn call(
        &mut self,
        function: Self::Function,
        args: &[Self::Value],
    ) -> Result<Self::Value, IrError>;

    fn append_block(
        &mut self,
        function: Self::Function,
        label: &str,
    ) -> Result<Self::Block, IrError>;

    /// Subsequent instructions are appended to `block`
    fn position_at_end(&mut self, block: Self::Block);

    fn current_block(&self) -> Option<Self::Block>;

    /// Branch to `then_block` when `condition` is nonzero, else to `else_block`
    fn cond_br(
        &mut self,
        condition: Self::Value,
        then_block: Self::Block,
        else_block: Self::Block,
    ) -> Result<(), IrError>;

    fn br(&mut self, target: Self::Block) -> Result<(), IrError>;

    /// Join point selecting the value of whichever predecessor ran
    fn merge(&mut self, incoming: &[(Self::Value, Self::Block)]) -> Result<Self::Value, IrError>;

    fn ret(&mut self, value: Self::Value) -> Result<(), IrError>;

    fn verify_function(&self, function: Self::Function) -> Result<(), VerifyError>;

    /// Drop the body of `function`, turning it back into a declaration
    fn clear_body(&mut self, function: Self::Function);

    /// Drop the function and its name entirely
    fn remove_function(&mut self, function: Self::Function);

    fn print_module(&self) -> String;
}
