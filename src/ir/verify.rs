//! Function verifier
//!
//! Checks a freshly built function before it is accepted into the module:
//! - the function has at least one block, and every block ends in exactly one terminator
//! - every operand refers to a parameter in range or an earlier result
//! - branch targets and call targets exist, and calls pass the right argument count
//! - `phi` instructions lead their block and list exactly its predecessors
//! - the entry block is never branched to

use super::errors::VerifyError;
use super::instr::Instruction;
use super::module::{Function, Module};
use super::types::{BlockId, FunctionId, InstId, Value};
use rustc_hash::{FxHashMap, FxHashSet};

/// Verify the function stored under `id`
pub fn verify_function(module: &Module, id: FunctionId) -> Result<(), VerifyError> {
    let function = module
        .function(id)
        .ok_or_else(|| VerifyError::new(id.to_string(), "function does not exist"))?;

    Verifier {
        module,
        id,
        function,
    }
    .run()
}

struct Verifier<'m> {
    module: &'m Module,
    id: FunctionId,
    function: &'m Function,
}

impl<'m> Verifier<'m> {
    fn error(&self, message: impl Into<String>) -> VerifyError {
        VerifyError::new(self.function.name(), message)
    }

    fn run(&self) -> Result<(), VerifyError> {
        if !self.function.has_body() {
            return Err(self.error("function has no body"));
        }

        let owners = self.instruction_owners()?;
        let predecessors = self.predecessors()?;

        for (index, block) in self.function.blocks().iter().enumerate() {
            self.check_block(index, &block.insts, &owners, &predecessors)?;
        }

        if predecessors.get(&0).is_some_and(|preds| !preds.is_empty()) {
            return Err(self.error("entry block has predecessors"));
        }

        Ok(())
    }

    /// Map every placed instruction to (block, position)
    fn instruction_owners(&self) -> Result<FxHashMap<usize, (usize, usize)>, VerifyError> {
        let mut owners = FxHashMap::default();

        for (block_index, block) in self.function.blocks().iter().enumerate() {
            for (position, inst) in block.insts.iter().enumerate() {
                if inst.index() >= self.function.insts().len() {
                    return Err(self.error(format!("block {block_index} lists unknown instruction")));
                }
                if owners.insert(inst.index(), (block_index, position)).is_some() {
                    return Err(self.error(format!(
                        "instruction %{} is placed twice",
                        inst.index()
                    )));
                }
            }
        }

        Ok(owners)
    }

    /// Predecessor sets keyed by block index
    fn predecessors(&self) -> Result<FxHashMap<usize, FxHashSet<usize>>, VerifyError> {
        let mut predecessors: FxHashMap<usize, FxHashSet<usize>> = FxHashMap::default();

        for (index, block) in self.function.blocks().iter().enumerate() {
            let Some(last) = block.insts.last() else {
                continue;
            };
            let Some(terminator) = self.function.inst(*last) else {
                continue;
            };
            for target in terminator.successors() {
                let target = self.local_block(target)?;
                predecessors.entry(target).or_default().insert(index);
            }
        }

        Ok(predecessors)
    }

    /// Index of a block that must belong to this function
    fn local_block(&self, block: BlockId) -> Result<usize, VerifyError> {
        if block.function != self.id || self.function.block(block.index).is_none() {
            return Err(self.error(format!("reference to foreign or missing block {block}")));
        }
        Ok(block.index)
    }

    fn check_block(
        &self,
        index: usize,
        insts: &[InstId],
        owners: &FxHashMap<usize, (usize, usize)>,
        predecessors: &FxHashMap<usize, FxHashSet<usize>>,
    ) -> Result<(), VerifyError> {
        if insts.is_empty() {
            return Err(self.error(format!("block {index} is empty")));
        }

        let mut leading_phis = true;
        for (position, id) in insts.iter().enumerate() {
            let inst = self
                .function
                .inst(*id)
                .ok_or_else(|| self.error(format!("block {index} lists unknown instruction")))?;
            let last = position + 1 == insts.len();

            if inst.is_terminator() != last {
                return Err(if last {
                    self.error(format!("block {index} does not end in a terminator"))
                } else {
                    self.error(format!("block {index} has a terminator before its end"))
                });
            }

            match inst {
                Instruction::Phi { incoming } => {
                    if !leading_phis {
                        return Err(self.error(format!("phi in block {index} follows other instructions")));
                    }
                    self.check_phi(index, incoming, predecessors)?;
                }
                _ => leading_phis = false,
            }

            if let Instruction::Call { callee, args } = inst {
                self.check_call(*callee, args.len())?;
            }

            for operand in inst.operands() {
                // phi operands flow in along edges and may be defined later
                let phi = matches!(inst, Instruction::Phi { .. });
                self.check_operand(operand, index, position, phi, owners)?;
            }
        }

        Ok(())
    }

    fn check_phi(
        &self,
        index: usize,
        incoming: &[(Value, BlockId)],
        predecessors: &FxHashMap<usize, FxHashSet<usize>>,
    ) -> Result<(), VerifyError> {
        if index == 0 {
            return Err(self.error("entry block contains a phi"));
        }

        let mut sources = FxHashSet::default();
        for (_, block) in incoming {
            if !sources.insert(self.local_block(*block)?) {
                return Err(self.error(format!("phi in block {index} lists a predecessor twice")));
            }
        }

        let empty = FxHashSet::default();
        let expected = predecessors.get(&index).unwrap_or(&empty);
        if &sources != expected {
            return Err(self.error(format!(
                "phi in block {index} does not match the block's predecessors"
            )));
        }

        Ok(())
    }

    fn check_call(&self, callee: FunctionId, args: usize) -> Result<(), VerifyError> {
        let target = self
            .module
            .function(callee)
            .ok_or_else(|| self.error(format!("call to missing function {callee}")))?;

        if target.arity() != args {
            return Err(self.error(format!(
                "call to '{}' passes {} arguments, expected {}",
                target.name(),
                args,
                target.arity()
            )));
        }

        Ok(())
    }

    fn check_operand(
        &self,
        operand: Value,
        block: usize,
        position: usize,
        phi: bool,
        owners: &FxHashMap<usize, (usize, usize)>,
    ) -> Result<(), VerifyError> {
        match operand {
            Value::Const(_) => Ok(()),
            Value::Param(n) if n < self.function.arity() => Ok(()),
            Value::Param(n) => Err(self.error(format!("parameter #{n} is out of range"))),
            Value::Inst(id) => {
                let defines = self
                    .function
                    .inst(id)
                    .is_some_and(Instruction::has_result);
                if !defines {
                    return Err(self.error(format!("%{} does not produce a value", id.index())));
                }

                let &(def_block, def_position) = owners
                    .get(&id.index())
                    .ok_or_else(|| self.error(format!("%{} is not placed in any block", id.index())))?;

                if !phi && def_block == block && def_position >= position {
                    return Err(self.error(format!("%{} is used before it is defined", id.index())));
                }

                Ok(())
            }
        }
    }
}
