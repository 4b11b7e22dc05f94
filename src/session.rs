//! Top-level driver
//!
//! A [`Session`] owns the module being built and runs source text through
//! the whole pipeline, one top-level form at a time:
//!
//! 1. parse the next form, skipping stray `;` separators
//! 2. lower it into the module
//! 3. evaluate it right away when it is a top-level expression
//!
//! A failing form yields [`Outcome::Failed`] and the session moves on to the
//! next one, so a run always consumes its whole input. Sessions keep their
//! module between runs, which lets later input call functions defined by
//! earlier input.

use crate::codegen::CodeGenerator;
use crate::error::{Error, Result};
use crate::ir::interp::{HostFunctions, Interpreter, MAX_CALL_DEPTH};
use crate::ir::module::Module;
use crate::ir::IrBuilder;
use crate::parser::ast::{FunctionDef, Item};
use crate::parser::lexer::LexAmbiguity;
use crate::parser::parse::Parser;
use crate::parser::precedence::PrecedenceTable;

/// Settings of a [`Session`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Binary operators and their binding strength
    pub precedence: PrecedenceTable,

    /// Functions `extern` declarations are linked against
    pub host: HostFunctions,

    /// Whether top-level expressions are executed
    pub evaluate: bool,

    /// Deepest call nesting allowed while evaluating
    pub call_depth_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            precedence: PrecedenceTable::default(),
            host: HostFunctions::standard(),
            evaluate: true,
            call_depth_limit: MAX_CALL_DEPTH,
        }
    }
}

/// Result of one top-level form
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A function definition was added to the module
    Defined { name: String, arity: usize },

    /// An `extern` declaration was added or updated
    Declared { name: String, arity: usize },

    /// A top-level expression and its value
    Evaluated(f64),

    /// A top-level expression was generated but evaluation is disabled
    Generated,

    Failed(Error),
}

pub struct Session {
    config: SessionConfig,
    codegen: CodeGenerator<Module>,
    warnings: Vec<LexAmbiguity>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            config,
            codegen: CodeGenerator::new(Module::default()),
            warnings: Vec::new(),
        }
    }

    /// Run every form of `source`
    pub fn run(&mut self, source: &str) -> Vec<Outcome> {
        self.run_with(source, |_, _| {})
    }

    /// Like [`Session::run`], handing each form to `observe` as soon as it is
    /// processed. Forms that failed to parse come without an item.
    pub fn run_with<F>(&mut self, source: &str, mut observe: F) -> Vec<Outcome>
    where
        F: FnMut(Option<&Item>, &Outcome),
    {
        let mut parser = Parser::new(source, &self.config.precedence);
        let mut outcomes = Vec::new();

        while let Some(parsed) = parser.next_item() {
            let outcome = match &parsed {
                Ok(item) => process(&mut self.codegen, &self.config, item),
                Err(err) => Outcome::Failed(err.clone().into()),
            };
            observe(parsed.as_ref().ok(), &outcome);
            outcomes.push(outcome);
        }

        self.warnings.extend(parser.take_ambiguities());
        outcomes
    }

    /// Number literals the lexer could only partly read, across all runs
    pub fn warnings(&self) -> &[LexAmbiguity] {
        &self.warnings
    }

    pub fn module(&self) -> &Module {
        self.codegen.builder()
    }

    pub fn print_module(&self) -> String {
        self.codegen.builder().print_module()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(SessionConfig::default())
    }
}

fn process(codegen: &mut CodeGenerator<Module>, config: &SessionConfig, item: &Item) -> Outcome {
    let result = match item {
        Item::Function(def) => codegen
            .codegen_function(def)
            .map(|_| Outcome::Defined {
                name: def.prototype.name.clone(),
                arity: def.prototype.arity(),
            })
            .map_err(Error::from),
        // a defined function keeps its own signature
        Item::Extern(prototype) => codegen
            .codegen_prototype(prototype)
            .map(|function| Outcome::Declared {
                name: prototype.name.clone(),
                arity: codegen.builder().param_count(function),
            })
            .map_err(Error::from),
        Item::TopLevelExpr(def) => evaluate(codegen, config, def),
    };

    result.unwrap_or_else(Outcome::Failed)
}

/// Generate the anonymous function, run it, and drop it again
fn evaluate(codegen: &mut CodeGenerator<Module>, config: &SessionConfig, def: &FunctionDef) -> Result<Outcome> {
    let function = codegen.codegen_function(def)?;

    let outcome = if config.evaluate {
        Interpreter::new(codegen.builder(), &config.host)
            .with_call_limit(config.call_depth_limit)
            .call(function, &[])
            .map(Outcome::Evaluated)
    } else {
        Ok(Outcome::Generated)
    };

    codegen.builder_mut().remove_function(function);
    Ok(outcome?)
}
