//! In-memory SSA module
//!
//! [`Module`] owns every function of a program and doubles as the builder:
//! it carries a single insertion point, like an LLVM `IRBuilder` bound to a
//! module. Functions live in slots addressed by [`FunctionId`]; removing a
//! function frees its slot and its name for good.

use super::errors::{IrError, VerifyError};
use super::instr::{BinaryKind, Instruction};
use super::types::{BlockId, FunctionId, InstId, Value};
use super::{verify, IrBuilder};
use rustc_hash::FxHashMap;

/// A labelled, ordered list of instructions
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: String,
    pub insts: Vec<InstId>,
}

/// A function: named double parameters, a double result, and an optional body
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    name: String,
    params: Vec<String>,
    blocks: Vec<Block>,
    insts: Vec<Instruction>,
}

impl Function {
    fn new(name: &str, params: &[String]) -> Self {
        Function {
            name: name.to_string(),
            params: params.to_vec(),
            blocks: Vec::new(),
            insts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn insts(&self) -> &[Instruction] {
        &self.insts
    }

    pub fn inst(&self, id: InstId) -> Option<&Instruction> {
        self.insts.get(id.0)
    }

    /// Declarations have no blocks
    pub fn has_body(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// Entry of the whole-program function table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub arity: usize,
    pub defined: bool,
}

/// A whole program plus the builder's insertion point
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    functions: Vec<Option<Function>>,
    by_name: FxHashMap<String, FunctionId>,
    insertion: Option<BlockId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            functions: Vec::new(),
            by_name: FxHashMap::default(),
            insertion: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0).and_then(Option::as_ref)
    }

    pub fn function_by_name(&self, name: &str) -> Option<(FunctionId, &Function)> {
        let id = *self.by_name.get(name)?;
        self.function(id).map(|function| (id, function))
    }

    /// Live functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> + '_ {
        self.functions
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|function| (FunctionId(index), function)))
    }

    /// The function table: every live function with its arity
    pub fn signatures(&self) -> Vec<Signature> {
        self.functions()
            .map(|(_, function)| Signature {
                name: function.name.clone(),
                arity: function.arity(),
                defined: function.has_body(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn function_mut(&mut self, id: FunctionId) -> Option<&mut Function> {
        self.functions.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Append `inst` at the insertion point
    fn emit(&mut self, inst: Instruction) -> Result<InstId, IrError> {
        let block = self.insertion.ok_or(IrError::NoInsertionPoint)?;
        let function = self
            .function_mut(block.function)
            .ok_or(IrError::UnknownFunction(block.function))?;

        let id = InstId(function.insts.len());
        let insts = &mut function
            .blocks
            .get_mut(block.index)
            .ok_or(IrError::UnknownBlock(block))?
            .insts;
        insts.push(id);
        function.insts.push(inst);

        Ok(id)
    }

    fn check_block(&self, block: BlockId) -> Result<(), IrError> {
        match self.function(block.function) {
            Some(function) if block.index < function.blocks.len() => Ok(()),
            Some(_) => Err(IrError::UnknownBlock(block)),
            None => Err(IrError::UnknownFunction(block.function)),
        }
    }
}

impl Default for Module {
    fn default() -> Self {
        Module::new("main")
    }
}

impl IrBuilder for Module {
    type Value = Value;
    type Function = FunctionId;
    type Block = BlockId;

    fn const_f64(&mut self, value: f64) -> Value {
        Value::Const(value)
    }

    fn binary(&mut self, kind: BinaryKind, lhs: Value, rhs: Value) -> Result<Value, IrError> {
        self.emit(Instruction::Binary { kind, lhs, rhs })
            .map(Value::Inst)
    }

    fn declare_function(&mut self, name: &str, params: &[String]) -> Option<FunctionId> {
        if name.is_empty() {
            return None;
        }

        if let Some(&id) = self.by_name.get(name) {
            if let Some(function) = self.function_mut(id) {
                if !function.has_body() {
                    function.params = params.to_vec();
                }
                return Some(id);
            }
        }

        let id = FunctionId(self.functions.len());
        self.functions.push(Some(Function::new(name, params)));
        self.by_name.insert(name.to_string(), id);
        Some(id)
    }

    fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_by_name(name).map(|(id, _)| id)
    }

    fn param_count(&self, function: FunctionId) -> usize {
        self.function(function).map_or(0, Function::arity)
    }

    fn param_values(&self, function: FunctionId) -> Vec<Value> {
        (0..self.param_count(function)).map(Value::Param).collect()
    }

    fn param_names(&self, function: FunctionId) -> Vec<String> {
        self.function(function)
            .map(|f| f.params.clone())
            .unwrap_or_default()
    }

    fn has_body(&self, function: FunctionId) -> bool {
        self.function(function).is_some_and(Function::has_body)
    }

    fn has_callers(&self, function: FunctionId) -> bool {
        self.functions().any(|(_, caller)| {
            caller.insts.iter().any(
                |inst| matches!(inst, Instruction::Call { callee, .. } if *callee == function),
            )
        })
    }

    fn call(&mut self, function: FunctionId, args: &[Value]) -> Result<Value, IrError> {
        if self.function(function).is_none() {
            return Err(IrError::UnknownFunction(function));
        }
        self.emit(Instruction::Call {
            callee: function,
            args: args.to_vec(),
        })
        .map(Value::Inst)
    }

    fn append_block(&mut self, function: FunctionId, label: &str) -> Result<BlockId, IrError> {
        let func = self
            .function_mut(function)
            .ok_or(IrError::UnknownFunction(function))?;

        func.blocks.push(Block {
            label: label.to_string(),
            insts: Vec::new(),
        });

        Ok(BlockId {
            function,
            index: func.blocks.len() - 1,
        })
    }

    fn position_at_end(&mut self, block: BlockId) {
        self.insertion = Some(block);
    }

    fn current_block(&self) -> Option<BlockId> {
        self.insertion
    }

    fn cond_br(
        &mut self,
        condition: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), IrError> {
        self.check_block(then_block)?;
        self.check_block(else_block)?;
        self.emit(Instruction::CondBr {
            condition,
            then_block,
            else_block,
        })
        .map(|_| ())
    }

    fn br(&mut self, target: BlockId) -> Result<(), IrError> {
        self.check_block(target)?;
        self.emit(Instruction::Br { target }).map(|_| ())
    }

    fn merge(&mut self, incoming: &[(Value, BlockId)]) -> Result<Value, IrError> {
        self.emit(Instruction::Phi {
            incoming: incoming.to_vec(),
        })
        .map(Value::Inst)
    }

    fn ret(&mut self, value: Value) -> Result<(), IrError> {
        self.emit(Instruction::Ret { value }).map(|_| ())
    }

    fn verify_function(&self, function: FunctionId) -> Result<(), VerifyError> {
        verify::verify_function(self, function)
    }

    fn clear_body(&mut self, function: FunctionId) {
        if let Some(func) = self.function_mut(function) {
            func.blocks.clear();
            func.insts.clear();
        }
        if self.insertion.is_some_and(|block| block.function == function) {
            self.insertion = None;
        }
    }

    fn remove_function(&mut self, function: FunctionId) {
        let Some(slot) = self.functions.get_mut(function.0) else {
            return;
        };
        if let Some(removed) = slot.take() {
            if self.by_name.get(&removed.name) == Some(&function) {
                self.by_name.remove(&removed.name);
            }
        }
        if self.insertion.is_some_and(|block| block.function == function) {
            self.insertion = None;
        }
    }

    fn print_module(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(params: &[&str]) -> Vec<String> {
        params.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_declare_is_idempotent() {
        let mut module = Module::default();
        let first = module.declare_function("sin", &names(&["x"])).unwrap();
        let second = module.declare_function("sin", &names(&["x"])).unwrap();

        assert_eq!(first, second);
        assert_eq!(module.len(), 1);
        assert_eq!(module.lookup_function("sin"), Some(first));
    }

    #[test]
    fn test_redeclare_replaces_signature_of_declaration() {
        let mut module = Module::default();
        let id = module.declare_function("f", &names(&["a"])).unwrap();
        module.declare_function("f", &names(&["a", "b"])).unwrap();

        assert_eq!(module.param_count(id), 2);
        assert_eq!(module.param_values(id), vec![Value::Param(0), Value::Param(1)]);
    }

    #[test]
    fn test_empty_name_cannot_be_declared() {
        let mut module = Module::default();
        assert!(module.declare_function("", &[]).is_none());
        assert!(module.is_empty());
    }

    #[test]
    fn test_emit_requires_insertion_point() {
        let mut module = Module::default();
        let err = module
            .binary(BinaryKind::Add, Value::Const(1.0), Value::Const(2.0))
            .unwrap_err();
        assert_eq!(err, IrError::NoInsertionPoint);
    }

    #[test]
    fn test_build_and_remove() {
        let mut module = Module::default();
        let id = module.declare_function("two", &[]).unwrap();
        let entry = module.append_block(id, "entry").unwrap();
        module.position_at_end(entry);

        let sum = module
            .binary(BinaryKind::Add, Value::Const(1.0), Value::Const(1.0))
            .unwrap();
        module.ret(sum).unwrap();

        assert!(module.has_body(id));
        assert_eq!(module.current_block(), Some(entry));
        assert!(module.verify_function(id).is_ok());

        module.remove_function(id);
        assert!(module.lookup_function("two").is_none());
        assert!(module.function(id).is_none());
        assert_eq!(module.current_block(), None);
        assert!(module.signatures().is_empty());
    }

    #[test]
    fn test_clear_body_keeps_declaration() {
        let mut module = Module::default();
        let id = module.declare_function("f", &names(&["x"])).unwrap();
        let entry = module.append_block(id, "entry").unwrap();
        module.position_at_end(entry);
        module.ret(Value::Param(0)).unwrap();

        module.clear_body(id);
        assert!(!module.has_body(id));
        assert_eq!(module.lookup_function("f"), Some(id));
        assert_eq!(module.param_names(id), names(&["x"]));
        assert_eq!(module.current_block(), None);
    }

    #[test]
    fn test_callers_are_tracked() {
        let mut module = Module::default();
        let callee = module.declare_function("f", &names(&["x"])).unwrap();
        assert!(!module.has_callers(callee));

        let caller = module.declare_function("g", &[]).unwrap();
        let entry = module.append_block(caller, "entry").unwrap();
        module.position_at_end(entry);
        let result = module.call(callee, &[Value::Const(1.0)]).unwrap();
        module.ret(result).unwrap();

        assert!(module.has_callers(callee));
        assert!(!module.has_callers(caller));
    }

    #[test]
    fn test_signatures_in_declaration_order() {
        let mut module = Module::default();
        module.declare_function("b", &names(&["x"])).unwrap();
        module.declare_function("a", &[]).unwrap();

        assert_eq!(
            module.signatures(),
            vec![
                Signature {
                    name: "b".to_string(),
                    arity: 1,
                    defined: false
                },
                Signature {
                    name: "a".to_string(),
                    arity: 0,
                    defined: false
                },
            ]
        );
    }
}
