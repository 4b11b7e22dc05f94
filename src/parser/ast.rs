// AST (Abstract Syntax Tree) definitions for the expression language

use std::fmt;

/// Name given to the synthetic function wrapping a bare top-level expression
pub const ANON_EXPR_NAME: &str = "__anon_expr";

/// Deepest expression nesting accepted by the parser and the code generator
pub const MAX_EXPR_DEPTH: usize = 256;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Expression nodes. Every node owns its children exclusively.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary {
        op: char,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: char, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
        }
    }

    pub fn if_else(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }
}

/// Fully parenthesized rendering: `1+2*3` displays as `(1+(2*3))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Binary { op, lhs, rhs } => write!(f, "({}{}{})", lhs, op, rhs),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => write!(
                f,
                "(if {} then {} else {})",
                condition, then_branch, else_branch
            ),
        }
    }
}

/// Function name and parameter names, with or without a body.
///
/// Parameter names are not checked for uniqueness; with duplicates the later
/// binding wins during codegen.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Prototype {
            name: name.into(),
            params,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(" "))
    }
}

/// A prototype together with its single body expression
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub prototype: Prototype,
    pub body: Expr,
}

impl FunctionDef {
    /// Wrap a bare top-level expression into a zero-parameter function
    pub fn anonymous(body: Expr) -> Self {
        FunctionDef {
            prototype: Prototype::new(ANON_EXPR_NAME, Vec::new()),
            body,
        }
    }
}

/// A single top-level form
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `def name(params) body`
    Function(FunctionDef),
    /// `extern name(params)`
    Extern(Prototype),
    /// A bare expression, wrapped as [`ANON_EXPR_NAME`]
    TopLevelExpr(FunctionDef),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Function(def) => write!(f, "def {} {}", def.prototype, def.body),
            Item::Extern(proto) => write!(f, "extern {}", proto),
            Item::TopLevelExpr(def) => write!(f, "{}", def.body),
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
