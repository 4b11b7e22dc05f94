//! Textual form of a module
//!
//! The output follows LLVM assembly closely enough to be read at a glance:
//!
//! ```text
//! ; ModuleID = 'main'
//!
//! declare double @sin(double %x)
//!
//! define double @twice(double %x) {
//! entry:
//!   %0 = fadd double %x, %x
//!   ret double %0
//! }
//! ```
//!
//! Instruction results are numbered by their slot in the function, so the
//! numbering may skip the slots taken by terminators.

use super::instr::Instruction;
use super::module::{Function, Module};
use super::types::Value;
use std::fmt;

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name())?;
        for (_, function) in self.functions() {
            writeln!(f)?;
            FunctionPrinter {
                module: self,
                function,
            }
            .fmt(f)?;
        }
        Ok(())
    }
}

struct FunctionPrinter<'m> {
    module: &'m Module,
    function: &'m Function,
}

impl FunctionPrinter<'_> {
    fn value(&self, value: Value) -> String {
        match value {
            Value::Const(v) => format!("{v:?}"),
            Value::Param(n) => match self.function.params().get(n) {
                Some(name) => format!("%{name}"),
                None => format!("%arg{n}"),
            },
            Value::Inst(id) => format!("%{}", id.index()),
        }
    }

    /// Block labels get their index appended, except for the entry block
    fn label(&self, index: usize) -> String {
        match self.function.block(index) {
            Some(block) if index == 0 => block.label.clone(),
            Some(block) => format!("{}{}", block.label, index),
            None => format!("bb{index}"),
        }
    }

    fn instruction(&self, inst: &Instruction) -> String {
        match inst {
            Instruction::Binary { kind, lhs, rhs } => format!(
                "{} double {}, {}",
                kind.mnemonic(),
                self.value(*lhs),
                self.value(*rhs)
            ),
            Instruction::Call { callee, args } => {
                let name = match self.module.function(*callee) {
                    Some(target) => target.name().to_string(),
                    None => callee.to_string(),
                };
                let args: Vec<String> = args
                    .iter()
                    .map(|arg| format!("double {}", self.value(*arg)))
                    .collect();
                format!("call double @{}({})", name, args.join(", "))
            }
            Instruction::Phi { incoming } => {
                let edges: Vec<String> = incoming
                    .iter()
                    .map(|(value, block)| format!("[ {}, %{} ]", self.value(*value), self.label(block.index)))
                    .collect();
                format!("phi double {}", edges.join(", "))
            }
            Instruction::Br { target } => format!("br label %{}", self.label(target.index)),
            Instruction::CondBr {
                condition,
                then_block,
                else_block,
            } => format!(
                "br double {}, label %{}, label %{}",
                self.value(*condition),
                self.label(then_block.index),
                self.label(else_block.index)
            ),
            Instruction::Ret { value } => format!("ret double {}", self.value(*value)),
        }
    }

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .function
            .params()
            .iter()
            .map(|name| format!("double %{name}"))
            .collect();

        if !self.function.has_body() {
            return writeln!(
                f,
                "declare double @{}({})",
                self.function.name(),
                params.join(", ")
            );
        }

        writeln!(
            f,
            "define double @{}({}) {{",
            self.function.name(),
            params.join(", ")
        )?;

        for (index, block) in self.function.blocks().iter().enumerate() {
            writeln!(f, "{}:", self.label(index))?;
            for inst_id in &block.insts {
                let Some(inst) = self.function.inst(*inst_id) else {
                    continue;
                };
                if inst.has_result() {
                    writeln!(f, "  %{} = {}", inst_id.index(), self.instruction(inst))?;
                } else {
                    writeln!(f, "  {}", self.instruction(inst))?;
                }
            }
        }

        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::module::Module;
    use crate::ir::types::Value;
    use crate::ir::{BinaryKind, IrBuilder};

    #[test]
    fn test_print_declaration_and_definition() {
        let mut module = Module::default();
        module.declare_function("sin", &["x".to_string()]).unwrap();

        let twice = module.declare_function("twice", &["x".to_string()]).unwrap();
        let entry = module.append_block(twice, "entry").unwrap();
        module.position_at_end(entry);
        let sum = module
            .binary(BinaryKind::Add, Value::Param(0), Value::Param(0))
            .unwrap();
        module.ret(sum).unwrap();

        let expected = "; ModuleID = 'main'\n\
                        \n\
                        declare double @sin(double %x)\n\
                        \n\
                        define double @twice(double %x) {\n\
                        entry:\n  \
                        %0 = fadd double %x, %x\n  \
                        ret double %0\n\
                        }\n";
        assert_eq!(module.to_string(), expected);
    }

    #[test]
    fn test_constants_keep_their_decimal_point() {
        let mut module = Module::default();
        let f = module.declare_function("one", &[]).unwrap();
        let entry = module.append_block(f, "entry").unwrap();
        module.position_at_end(entry);
        let one = module.const_f64(1.0);
        module.ret(one).unwrap();

        assert!(module.print_module().contains("ret double 1.0"));
    }
}
