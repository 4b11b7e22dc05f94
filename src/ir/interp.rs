//! Module interpreter
//!
//! Executes functions of a [`Module`] directly. Body-less functions are linked
//! by name against a table of [`HostFunctions`], the way a JIT resolves
//! `extern` declarations against the process's symbols.
//!
//! # Control Flow
//!
//! Blocks run from the entry block; a `phi` picks the incoming value of the
//! block that branched into the current one. Recursion uses the Rust stack and
//! is bounded by a call-depth limit, [`MAX_CALL_DEPTH`] unless configured
//! otherwise.

use super::instr::Instruction;
use super::module::{Function, Module};
use super::types::{FunctionId, Value};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Default nesting of calls before execution is aborted
pub const MAX_CALL_DEPTH: usize = 1000;

/// Signature of a native function callable from the IR
pub type HostFn = fn(&[f64]) -> f64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("Function {0} does not exist")]
    UnknownFunction(FunctionId),

    #[error("Function '{function}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Unresolved external function '{name}'")]
    Unlinked { name: String },

    #[error("External function '{name}' is declared with {declared} parameters but the host provides {host}")]
    HostArityMismatch {
        name: String,
        declared: usize,
        host: usize,
    },

    #[error("Call depth exceeded the limit of {limit}")]
    CallDepthExceeded { limit: usize },

    #[error("Function '{function}' cannot be executed: {message}")]
    Malformed { function: String, message: String },
}

/// Native functions available to `extern` declarations
#[derive(Debug, Clone, Default)]
pub struct HostFunctions {
    table: FxHashMap<String, (usize, HostFn)>,
}

impl HostFunctions {
    /// No host functions at all
    pub fn new() -> Self {
        HostFunctions::default()
    }

    /// The usual libm functions
    pub fn standard() -> Self {
        HostFunctions::new()
            .with("sin", 1, |a| a[0].sin())
            .with("cos", 1, |a| a[0].cos())
            .with("tan", 1, |a| a[0].tan())
            .with("atan", 1, |a| a[0].atan())
            .with("atan2", 2, |a| a[0].atan2(a[1]))
            .with("sqrt", 1, |a| a[0].sqrt())
            .with("exp", 1, |a| a[0].exp())
            .with("log", 1, |a| a[0].ln())
            .with("fabs", 1, |a| a[0].abs())
            .with("floor", 1, |a| a[0].floor())
            .with("ceil", 1, |a| a[0].ceil())
            .with("pow", 2, |a| a[0].powf(a[1]))
    }

    pub fn with(mut self, name: &str, arity: usize, function: HostFn) -> Self {
        self.register(name, arity, function);
        self
    }

    /// Add or replace a host function
    pub fn register(&mut self, name: &str, arity: usize, function: HostFn) {
        self.table.insert(name.to_string(), (arity, function));
    }

    pub fn get(&self, name: &str) -> Option<(usize, HostFn)> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

/// Executes functions of a module
pub struct Interpreter<'m> {
    module: &'m Module,
    host: &'m HostFunctions,
    call_limit: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module, host: &'m HostFunctions) -> Self {
        Interpreter {
            module,
            host,
            call_limit: MAX_CALL_DEPTH,
        }
    }

    /// Abort once calls nest `limit` deep
    pub fn with_call_limit(mut self, limit: usize) -> Self {
        self.call_limit = limit;
        self
    }

    /// Call `function` with `args` and return its result
    pub fn call(&self, function: FunctionId, args: &[f64]) -> Result<f64, ExecError> {
        self.invoke(function, args, 0)
    }

    fn invoke(&self, id: FunctionId, args: &[f64], depth: usize) -> Result<f64, ExecError> {
        if depth >= self.call_limit {
            return Err(ExecError::CallDepthExceeded {
                limit: self.call_limit,
            });
        }

        let function = self
            .module
            .function(id)
            .ok_or(ExecError::UnknownFunction(id))?;

        if function.arity() != args.len() {
            return Err(ExecError::ArityMismatch {
                function: function.name().to_string(),
                expected: function.arity(),
                got: args.len(),
            });
        }

        if function.has_body() {
            self.run_body(function, args, depth)
        } else {
            self.call_host(function, args)
        }
    }

    fn call_host(&self, function: &Function, args: &[f64]) -> Result<f64, ExecError> {
        let (arity, host_fn) = self
            .host
            .get(function.name())
            .ok_or_else(|| ExecError::Unlinked {
                name: function.name().to_string(),
            })?;

        if arity != args.len() {
            return Err(ExecError::HostArityMismatch {
                name: function.name().to_string(),
                declared: args.len(),
                host: arity,
            });
        }

        Ok(host_fn(args))
    }

    fn run_body(&self, function: &Function, args: &[f64], depth: usize) -> Result<f64, ExecError> {
        let malformed = |message: &str| ExecError::Malformed {
            function: function.name().to_string(),
            message: message.to_string(),
        };

        let mut results: Vec<Option<f64>> = vec![None; function.insts().len()];
        let mut previous: Option<usize> = None;
        let mut current = 0usize;

        let value = |results: &[Option<f64>], value: Value| -> Result<f64, ExecError> {
            match value {
                Value::Const(v) => Ok(v),
                Value::Param(n) => args
                    .get(n)
                    .copied()
                    .ok_or_else(|| malformed("parameter out of range")),
                Value::Inst(id) => results
                    .get(id.index())
                    .copied()
                    .flatten()
                    .ok_or_else(|| malformed("value used before it is computed")),
            }
        };

        'blocks: loop {
            let block = function
                .block(current)
                .ok_or_else(|| malformed("branch to a missing block"))?;

            for inst_id in &block.insts {
                let inst = function
                    .inst(*inst_id)
                    .ok_or_else(|| malformed("missing instruction"))?;

                let result = match inst {
                    Instruction::Binary { kind, lhs, rhs } => {
                        let lhs = value(&results, *lhs)?;
                        let rhs = value(&results, *rhs)?;
                        kind.apply(lhs, rhs)
                    }
                    Instruction::Call { callee, args } => {
                        let args = args
                            .iter()
                            .map(|arg| value(&results, *arg))
                            .collect::<Result<Vec<_>, _>>()?;
                        self.invoke(*callee, &args, depth + 1)?
                    }
                    Instruction::Phi { incoming } => {
                        let from = previous.ok_or_else(|| malformed("phi in the entry block"))?;
                        let (incoming_value, _) = incoming
                            .iter()
                            .find(|(_, block)| block.index == from)
                            .ok_or_else(|| malformed("phi has no value for its predecessor"))?;
                        value(&results, *incoming_value)?
                    }
                    Instruction::Br { target } => {
                        previous = Some(current);
                        current = target.index;
                        continue 'blocks;
                    }
                    Instruction::CondBr {
                        condition,
                        then_block,
                        else_block,
                    } => {
                        let taken = if value(&results, *condition)? != 0.0 {
                            then_block
                        } else {
                            else_block
                        };
                        previous = Some(current);
                        current = taken.index;
                        continue 'blocks;
                    }
                    Instruction::Ret { value: returned } => {
                        return value(&results, *returned);
                    }
                };

                results[inst_id.index()] = Some(result);
            }

            return Err(malformed("block falls through without a terminator"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryKind, IrBuilder};

    #[test]
    fn test_unlinked_extern() {
        let mut module = Module::default();
        let sin = module.declare_function("sin", &["x".to_string()]).unwrap();
        let host = HostFunctions::new();

        let err = Interpreter::new(&module, &host).call(sin, &[0.0]).unwrap_err();
        assert_eq!(
            err,
            ExecError::Unlinked {
                name: "sin".to_string()
            }
        );
    }

    #[test]
    fn test_host_call() {
        let mut module = Module::default();
        let sqrt = module.declare_function("sqrt", &["x".to_string()]).unwrap();
        let host = HostFunctions::standard();

        let result = Interpreter::new(&module, &host).call(sqrt, &[16.0]).unwrap();
        assert_eq!(result, 4.0);
    }

    #[test]
    fn test_host_arity_mismatch() {
        let mut module = Module::default();
        let pow = module.declare_function("pow", &["x".to_string()]).unwrap();
        let host = HostFunctions::standard();

        let err = Interpreter::new(&module, &host).call(pow, &[2.0]).unwrap_err();
        assert!(matches!(err, ExecError::HostArityMismatch { host: 2, .. }));
    }

    #[test]
    fn test_select_with_phi() {
        // max(a, b) = if a < b then b else a
        let mut module = Module::default();
        let max = module
            .declare_function("max", &["a".to_string(), "b".to_string()])
            .unwrap();
        let entry = module.append_block(max, "entry").unwrap();
        let then_block = module.append_block(max, "then").unwrap();
        let else_block = module.append_block(max, "else").unwrap();
        let merge_block = module.append_block(max, "ifcont").unwrap();

        module.position_at_end(entry);
        let cond = module
            .binary(BinaryKind::LessThan, Value::Param(0), Value::Param(1))
            .unwrap();
        module.cond_br(cond, then_block, else_block).unwrap();
        module.position_at_end(then_block);
        module.br(merge_block).unwrap();
        module.position_at_end(else_block);
        module.br(merge_block).unwrap();
        module.position_at_end(merge_block);
        let phi = module
            .merge(&[(Value::Param(1), then_block), (Value::Param(0), else_block)])
            .unwrap();
        module.ret(phi).unwrap();

        let host = HostFunctions::new();
        let interp = Interpreter::new(&module, &host);
        assert_eq!(interp.call(max, &[1.0, 5.0]).unwrap(), 5.0);
        assert_eq!(interp.call(max, &[7.0, 5.0]).unwrap(), 7.0);
    }

    #[test]
    fn test_unbounded_recursion_is_stopped() {
        let mut module = Module::default();
        let forever = module.declare_function("forever", &[]).unwrap();
        let entry = module.append_block(forever, "entry").unwrap();
        module.position_at_end(entry);
        let result = module.call(forever, &[]).unwrap();
        module.ret(result).unwrap();

        let host = HostFunctions::new();
        let err = Interpreter::new(&module, &host)
            .with_call_limit(64)
            .call(forever, &[])
            .unwrap_err();
        assert_eq!(err, ExecError::CallDepthExceeded { limit: 64 });
    }
}
