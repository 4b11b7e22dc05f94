//! Expression lowering
//!
//! Nesting is counted the way the parser counts it: call arguments, `if`
//! arms and operands that are themselves binary expressions each go one
//! level deeper. A left-associated chain such as `1+1+...+1` is lowered in a
//! loop and stays at the level of its first operand.

use super::engine::{CodeGenerator, Scope};
use super::errors::CodegenError;
use crate::ir::{BinaryKind, IrBuilder, IrError};
use crate::parser::ast::{Expr, MAX_EXPR_DEPTH};

impl<B: IrBuilder> CodeGenerator<B> {
    /// Lower an expression at the current insertion point
    pub(crate) fn lower_expr(
        &mut self,
        expr: &Expr,
        scope: &Scope<B::Value>,
    ) -> Result<B::Value, CodegenError> {
        match expr {
            Expr::Number(value) => Ok(self.builder_mut().const_f64(*value)),
            Expr::Variable(name) => scope
                .lookup(name)
                .ok_or_else(|| CodegenError::UndefinedVariable { name: name.clone() }),
            Expr::Binary { .. } => self.lower_binary(expr, scope),
            Expr::Call { callee, args } => self.lower_call(callee, args, scope),
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch, scope),
        }
    }

    /// Lower `expr` one nesting level deeper, refusing to pass [`MAX_EXPR_DEPTH`]
    fn lower_nested(
        &mut self,
        expr: &Expr,
        scope: &Scope<B::Value>,
    ) -> Result<B::Value, CodegenError> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(CodegenError::TooDeep {
                limit: MAX_EXPR_DEPTH,
            });
        }

        self.depth += 1;
        let result = self.lower_expr(expr, scope);
        self.depth -= 1;

        result
    }

    /// Lower a chain `((base op r1) op r2) ...` without recursing down its
    /// left spine. Right operands are lowered before left ones, outermost
    /// first.
    fn lower_binary(
        &mut self,
        expr: &Expr,
        scope: &Scope<B::Value>,
    ) -> Result<B::Value, CodegenError> {
        let mut spine = Vec::new();
        let mut base = expr;
        while let Expr::Binary { op, lhs, rhs } = base {
            spine.push((*op, rhs.as_ref()));
            base = lhs.as_ref();
        }

        let mut rights = Vec::with_capacity(spine.len());
        for (_, rhs) in &spine {
            let value = match rhs {
                Expr::Binary { .. } => self.lower_nested(rhs, scope)?,
                _ => self.lower_expr(rhs, scope)?,
            };
            rights.push(value);
        }

        let mut acc = self.lower_expr(base, scope)?;
        for ((op, _), right) in spine.iter().zip(rights).rev() {
            let kind =
                BinaryKind::from_symbol(*op).ok_or(CodegenError::UnsupportedOperator { op: *op })?;
            acc = self.builder_mut().binary(kind, acc, right)?;
        }

        Ok(acc)
    }

    fn lower_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        scope: &Scope<B::Value>,
    ) -> Result<B::Value, CodegenError> {
        let function = self
            .builder()
            .lookup_function(callee)
            .ok_or_else(|| CodegenError::UndefinedFunction {
                name: callee.to_string(),
            })?;

        let expected = self.builder().param_count(function);
        if expected != args.len() {
            return Err(CodegenError::ArityMismatch {
                function: callee.to_string(),
                expected,
                got: args.len(),
            });
        }

        let values = args
            .iter()
            .map(|arg| self.lower_nested(arg, scope))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.builder_mut().call(function, &values)?)
    }

    fn lower_if(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
        scope: &Scope<B::Value>,
    ) -> Result<B::Value, CodegenError> {
        let function = self.function.ok_or(IrError::NoInsertionPoint)?;
        let cond = self.lower_nested(condition, scope)?;

        let builder = self.builder_mut();
        let then_block = builder.append_block(function, "then")?;
        let else_block = builder.append_block(function, "else")?;
        let merge_block = builder.append_block(function, "ifcont")?;
        builder.cond_br(cond, then_block, else_block)?;

        // each arm may end in a different block than it started in
        self.builder_mut().position_at_end(then_block);
        let then_value = self.lower_nested(then_branch, scope)?;
        let then_end = self.end_branch(merge_block)?;

        self.builder_mut().position_at_end(else_block);
        let else_value = self.lower_nested(else_branch, scope)?;
        let else_end = self.end_branch(merge_block)?;

        let builder = self.builder_mut();
        builder.position_at_end(merge_block);
        Ok(builder.merge(&[(then_value, then_end), (else_value, else_end)])?)
    }

    /// Jump to `merge_block` and return the block the jump leaves from
    fn end_branch(&mut self, merge_block: B::Block) -> Result<B::Block, CodegenError> {
        let builder = self.builder_mut();
        let end = builder.current_block().ok_or(IrError::NoInsertionPoint)?;
        builder.br(merge_block)?;
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::{CodeGenerator, CodegenError};
    use crate::ir::interp::{HostFunctions, Interpreter};
    use crate::ir::module::Module;
    use crate::ir::IrBuilder;
    use crate::parser::ast::{Expr, FunctionDef, Prototype, MAX_EXPR_DEPTH};

    fn var(name: &str) -> Expr {
        Expr::Variable(name.to_string())
    }

    fn eval(codegen: &mut CodeGenerator<Module>, body: Expr) -> Result<f64, CodegenError> {
        let f = codegen.codegen_function(&FunctionDef::anonymous(body))?;
        let host = HostFunctions::new();
        let result = Interpreter::new(codegen.builder(), &host).call(f, &[]).unwrap();
        codegen.builder_mut().remove_function(f);
        Ok(result)
    }

    #[test]
    fn test_arithmetic() {
        let mut codegen = CodeGenerator::new(Module::default());
        let body = Expr::binary(
            '-',
            Expr::Number(10.0),
            Expr::binary('*', Expr::Number(2.0), Expr::Number(3.0)),
        );
        assert_eq!(eval(&mut codegen, body).unwrap(), 4.0);
    }

    #[test]
    fn test_unsupported_operator() {
        let mut codegen = CodeGenerator::new(Module::default());
        let body = Expr::binary('/', Expr::Number(1.0), Expr::Number(2.0));
        assert_eq!(
            eval(&mut codegen, body).unwrap_err(),
            CodegenError::UnsupportedOperator { op: '/' }
        );
        assert!(codegen.builder().is_empty());
    }

    #[test]
    fn test_existence_checked_before_arity() {
        let mut codegen = CodeGenerator::new(Module::default());
        let err = eval(&mut codegen, Expr::call("nope", vec![])).unwrap_err();
        assert_eq!(err, CodegenError::UndefinedFunction { name: "nope".into() });
    }

    #[test]
    fn test_arity_checked_before_arguments() {
        let mut codegen = CodeGenerator::new(Module::default());
        codegen
            .codegen_prototype(&Prototype::new("g", vec!["a".into()]))
            .unwrap();

        // the undefined variable would fail too, but arity comes first
        let err = eval(&mut codegen, Expr::call("g", vec![var("x"), var("y")])).unwrap_err();
        assert_eq!(
            err,
            CodegenError::ArityMismatch {
                function: "g".into(),
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn test_nested_if() {
        let mut codegen = CodeGenerator::new(Module::default());
        let inner = Expr::if_else(Expr::Number(0.0), Expr::Number(1.0), Expr::Number(2.0));
        let body = Expr::if_else(Expr::Number(1.0), inner, Expr::Number(3.0));
        assert_eq!(eval(&mut codegen, body).unwrap(), 2.0);
    }

    #[test]
    fn test_long_left_chain() {
        let mut codegen = CodeGenerator::new(Module::default());
        let mut body = Expr::Number(1.0);
        for _ in 0..300 {
            body = Expr::binary('+', body, Expr::Number(1.0));
        }
        assert_eq!(eval(&mut codegen, body).unwrap(), 301.0);
    }

    #[test]
    fn test_chain_operand_order() {
        // (10 - 4) - 3, with a nested right operand: 10 - 4 - (2 * 1.5)
        let mut codegen = CodeGenerator::new(Module::default());
        let body = Expr::binary(
            '-',
            Expr::binary('-', Expr::Number(10.0), Expr::Number(4.0)),
            Expr::binary('*', Expr::Number(2.0), Expr::Number(1.5)),
        );
        assert_eq!(eval(&mut codegen, body).unwrap(), 3.0);
    }

    #[test]
    fn test_depth_limit() {
        let mut codegen = CodeGenerator::new(Module::default());
        let mut body = Expr::Number(1.0);
        for _ in 0..300 {
            body = Expr::binary('+', Expr::Number(1.0), body);
        }
        let err = eval(&mut codegen, body).unwrap_err();
        assert_eq!(err, CodegenError::TooDeep { limit: MAX_EXPR_DEPTH });
        assert!(codegen.builder().is_empty());
    }

    #[test]
    fn test_depth_limit_through_calls() {
        let mut codegen = CodeGenerator::new(Module::default());
        codegen
            .codegen_prototype(&Prototype::new("id", vec!["x".into()]))
            .unwrap();

        let mut body = Expr::Number(1.0);
        for _ in 0..300 {
            body = Expr::call("id", vec![body]);
        }
        let err = eval(&mut codegen, body).unwrap_err();
        assert_eq!(err, CodegenError::TooDeep { limit: MAX_EXPR_DEPTH });
        assert_eq!(codegen.builder().signatures().len(), 1);
    }
}
