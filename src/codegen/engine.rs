// Code generator for Kaleidoscope functions

use crate::codegen::errors::CodegenError;
use crate::ir::IrBuilder;
use crate::parser::ast::{FunctionDef, Prototype};
use rustc_hash::FxHashMap;

/// Names visible while lowering one function body
#[derive(Debug, Clone)]
pub struct Scope<V> {
    bindings: FxHashMap<String, V>,
}

impl<V: Copy> Scope<V> {
    pub fn new() -> Self {
        Scope {
            bindings: FxHashMap::default(),
        }
    }

    /// Bind `name`, replacing an earlier binding of the same name
    pub fn bind(&mut self, name: &str, value: V) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<V> {
        self.bindings.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<V: Copy> Default for Scope<V> {
    fn default() -> Self {
        Scope::new()
    }
}

/// Lowers prototypes and function definitions through an [`IrBuilder`]
pub struct CodeGenerator<B: IrBuilder> {
    /// The backend, which also owns the function table
    builder: B,

    /// Function whose body is being lowered
    pub(crate) function: Option<B::Function>,

    /// Current expression nesting while lowering
    pub(crate) depth: usize,
}

impl<B: IrBuilder> CodeGenerator<B> {
    pub fn new(builder: B) -> Self {
        CodeGenerator {
            builder,
            function: None,
            depth: 0,
        }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    pub fn into_builder(self) -> B {
        self.builder
    }

    /// Declare the signature of `prototype`: one double per parameter,
    /// returning a double.
    ///
    /// A declaration nobody calls yet may change its arity; one that is
    /// already called keeps it. A function with a body keeps its signature.
    pub fn codegen_prototype(&mut self, prototype: &Prototype) -> Result<B::Function, CodegenError> {
        if let Some(existing) = self.builder.lookup_function(&prototype.name) {
            let expected = self.builder.param_count(existing);
            if !self.builder.has_body(existing)
                && expected != prototype.arity()
                && self.builder.has_callers(existing)
            {
                return Err(CodegenError::SignatureConflict {
                    name: prototype.name.clone(),
                    expected,
                    got: prototype.arity(),
                });
            }
        }

        self.builder
            .declare_function(&prototype.name, &prototype.params)
            .ok_or_else(|| CodegenError::MissingPrototype {
                name: prototype.name.clone(),
            })
    }

    /// Generate a complete function. On failure the module is left as it
    /// was: a function created here is removed again, and a declaration the
    /// definition took over goes back to its previous signature.
    pub fn codegen_function(&mut self, def: &FunctionDef) -> Result<B::Function, CodegenError> {
        let name = &def.prototype.name;

        // a body is never replaced, and the existing function is left alone
        let declared = match self.builder.lookup_function(name) {
            Some(existing) if self.builder.has_body(existing) => {
                return Err(CodegenError::Redefinition { name: name.clone() });
            }
            Some(existing) => Some(self.builder.param_names(existing)),
            None => None,
        };

        let function = self.codegen_prototype(&def.prototype)?;

        self.function = Some(function);
        self.depth = 0;
        let result = self.codegen_body(function, def);
        self.function = None;

        match result {
            Ok(()) => Ok(function),
            Err(err) => {
                match declared {
                    Some(params) => {
                        self.builder.clear_body(function);
                        self.builder.declare_function(name, &params);
                    }
                    None => self.builder.remove_function(function),
                }
                Err(err)
            }
        }
    }

    fn codegen_body(&mut self, function: B::Function, def: &FunctionDef) -> Result<(), CodegenError> {
        let entry = self.builder.append_block(function, "entry")?;
        self.builder.position_at_end(entry);

        // later duplicates of a parameter name shadow earlier ones
        let mut scope = Scope::new();
        for (name, value) in def
            .prototype
            .params
            .iter()
            .zip(self.builder.param_values(function))
        {
            scope.bind(name, value);
        }

        let value = self.lower_expr(&def.body, &scope)?;
        self.builder.ret(value)?;
        self.builder.verify_function(function)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::module::Module;
    use crate::parser::ast::Expr;

    fn generator() -> CodeGenerator<Module> {
        CodeGenerator::new(Module::default())
    }

    fn def(name: &str, params: &[&str], body: Expr) -> FunctionDef {
        FunctionDef {
            prototype: Prototype::new(name, params.iter().map(|p| p.to_string()).collect()),
            body,
        }
    }

    #[test]
    fn test_define_function() {
        let mut codegen = generator();
        let f = codegen
            .codegen_function(&def(
                "add",
                &["a", "b"],
                Expr::binary('+', Expr::Variable("a".into()), Expr::Variable("b".into())),
            ))
            .unwrap();

        assert!(codegen.builder().has_body(f));
        assert_eq!(codegen.builder().param_count(f), 2);
    }

    #[test]
    fn test_failed_function_is_removed() {
        let mut codegen = generator();
        let err = codegen
            .codegen_function(&def("f", &["x"], Expr::Variable("y".into())))
            .unwrap_err();

        assert_eq!(err, CodegenError::UndefinedVariable { name: "y".into() });
        assert!(codegen.builder().lookup_function("f").is_none());
        assert!(codegen.builder().is_empty());
    }

    #[test]
    fn test_definition_over_extern() {
        let mut codegen = generator();
        codegen
            .codegen_prototype(&Prototype::new("f", vec!["a".into()]))
            .unwrap();
        let f = codegen
            .codegen_function(&def("f", &["x", "y"], Expr::Variable("y".into())))
            .unwrap();

        assert_eq!(codegen.builder().param_count(f), 2);
        assert_eq!(codegen.builder().len(), 1);
    }

    #[test]
    fn test_failed_definition_restores_declaration() {
        let mut codegen = generator();
        codegen
            .codegen_prototype(&Prototype::new("f", vec!["x".into()]))
            .unwrap();
        let g = codegen
            .codegen_function(&def("g", &["y"], Expr::call("f", vec![Expr::Variable("y".into())])))
            .unwrap();

        let err = codegen
            .codegen_function(&def("f", &["a"], Expr::Variable("z".into())))
            .unwrap_err();
        assert_eq!(err, CodegenError::UndefinedVariable { name: "z".into() });

        let f = codegen.builder().lookup_function("f").unwrap();
        assert!(!codegen.builder().has_body(f));
        assert_eq!(codegen.builder().param_names(f), vec!["x".to_string()]);
        assert!(codegen.builder().verify_function(g).is_ok());
    }

    #[test]
    fn test_called_declaration_keeps_its_arity() {
        let mut codegen = generator();
        codegen
            .codegen_prototype(&Prototype::new("f", vec!["x".into()]))
            .unwrap();
        let g = codegen
            .codegen_function(&def("g", &["y"], Expr::call("f", vec![Expr::Variable("y".into())])))
            .unwrap();

        let conflict = CodegenError::SignatureConflict {
            name: "f".into(),
            expected: 1,
            got: 2,
        };
        let err = codegen
            .codegen_prototype(&Prototype::new("f", vec!["a".into(), "b".into()]))
            .unwrap_err();
        assert_eq!(err, conflict);

        let err = codegen
            .codegen_function(&def("f", &["a", "b"], Expr::Variable("a".into())))
            .unwrap_err();
        assert_eq!(err, conflict);

        let f = codegen.builder().lookup_function("f").unwrap();
        assert_eq!(codegen.builder().param_count(f), 1);
        assert!(codegen.builder().verify_function(g).is_ok());

        // same arity is still fine
        codegen
            .codegen_function(&def("f", &["a"], Expr::Variable("a".into())))
            .unwrap();
        assert!(codegen.builder().has_body(f));
    }

    #[test]
    fn test_redefinition_keeps_first_body() {
        let mut codegen = generator();
        codegen
            .codegen_function(&def("one", &[], Expr::Number(1.0)))
            .unwrap();
        let err = codegen
            .codegen_function(&def("one", &[], Expr::Number(2.0)))
            .unwrap_err();

        assert_eq!(err, CodegenError::Redefinition { name: "one".into() });
        let f = codegen.builder().lookup_function("one").unwrap();
        assert!(codegen.builder().has_body(f));
    }

    #[test]
    fn test_empty_prototype_name() {
        let mut codegen = generator();
        let err = codegen
            .codegen_prototype(&Prototype::new("", vec![]))
            .unwrap_err();
        assert!(matches!(err, CodegenError::MissingPrototype { .. }));
    }

    #[test]
    fn test_duplicate_parameter_binds_last() {
        let mut scope = Scope::new();
        scope.bind("x", 0);
        scope.bind("x", 1);
        assert_eq!(scope.lookup("x"), Some(1));
        assert_eq!(scope.len(), 1);
    }
}
