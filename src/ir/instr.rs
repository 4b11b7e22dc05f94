//! IR Instructions

use super::types::{BlockId, FunctionId, Value};

/// Arithmetic and comparison operations on doubles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryKind {
    Mul,
    Add,
    Sub,
    /// `lhs < rhs` as `1.0` or `0.0`
    LessThan,
}

impl BinaryKind {
    /// Operation for a source-level operator symbol
    pub fn from_symbol(op: char) -> Option<Self> {
        match op {
            '*' => Some(BinaryKind::Mul),
            '+' => Some(BinaryKind::Add),
            '-' => Some(BinaryKind::Sub),
            '<' => Some(BinaryKind::LessThan),
            _ => None,
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryKind::Mul => lhs * rhs,
            BinaryKind::Add => lhs + rhs,
            BinaryKind::Sub => lhs - rhs,
            BinaryKind::LessThan => {
                if lhs < rhs {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryKind::Mul => "fmul",
            BinaryKind::Add => "fadd",
            BinaryKind::Sub => "fsub",
            BinaryKind::LessThan => "flt",
        }
    }
}

/// An instruction in the IR
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Binary {
        kind: BinaryKind,
        lhs: Value,
        rhs: Value,
    },
    Call {
        callee: FunctionId,
        args: Vec<Value>,
    },
    /// Selects the value flowing in from the predecessor that was executed
    Phi { incoming: Vec<(Value, BlockId)> },
    Br { target: BlockId },
    /// Branches to `then_block` when `condition != 0.0`
    CondBr {
        condition: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret { value: Value },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Br { .. } | Instruction::CondBr { .. } | Instruction::Ret { .. }
        )
    }

    /// Whether the instruction defines a value
    pub fn has_result(&self) -> bool {
        !self.is_terminator()
    }

    /// Values read by the instruction
    pub fn operands(&self) -> Vec<Value> {
        match self {
            Instruction::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Instruction::Call { args, .. } => args.clone(),
            Instruction::Phi { incoming } => incoming.iter().map(|(value, _)| *value).collect(),
            Instruction::Br { .. } => Vec::new(),
            Instruction::CondBr { condition, .. } => vec![*condition],
            Instruction::Ret { value } => vec![*value],
        }
    }

    /// Blocks control may transfer to
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Instruction::Br { target } => vec![*target],
            Instruction::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        assert_eq!(BinaryKind::from_symbol('*'), Some(BinaryKind::Mul));
        assert_eq!(BinaryKind::from_symbol('<'), Some(BinaryKind::LessThan));
        assert_eq!(BinaryKind::from_symbol('/'), None);
    }

    #[test]
    fn test_less_than_yields_float_boolean() {
        assert_eq!(BinaryKind::LessThan.apply(1.0, 2.0), 1.0);
        assert_eq!(BinaryKind::LessThan.apply(2.0, 2.0), 0.0);
        assert_eq!(BinaryKind::Sub.apply(2.0, 5.0), -3.0);
    }
}
