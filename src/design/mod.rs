//! The elaborated-design data contract.
//!
//! SystemVerilog parsing and elaboration are external collaborators: this module only
//! defines the shape of tree they hand back (module definitions, an instance tree,
//! procedural blocks, statements, and expressions with resolved symbol references) and
//! a [`Loader`] trait for obtaining one. [`JsonLoader`] is the reference implementation,
//! reading a serialized tree — the stand-in used by front-ends that elaborate out of
//! process and by this crate's own tests.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::anyerror::CodeFault;

pub mod operator;
pub use operator::Operator;

/// Signal/port bit width in bits.
pub type Width = u32;

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
    Inout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub direction: Direction,
    pub width: Width,
}

/// A data declaration (a `reg`/`logic`/`wire` declared outside a procedural block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    pub width: Width,
    /// `true` for a declaration that is a register updated only inside `always_ff`
    /// bodies (its value should carry across cycles, per the store reset discipline);
    /// `false` for a purely combinational signal re-derived every cycle.
    pub is_registered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousAssign {
    pub lhs: String,
    pub rhs: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProceduralBlockKind {
    AlwaysComb,
    AlwaysFf,
    AlwaysLatch,
    Always,
    Initial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProceduralBlock {
    pub kind: ProceduralBlockKind,
    /// Raw sensitivity-list text, kept only for diagnostics (e.g. `"posedge clk"`).
    pub sensitivity: String,
    pub body: Stmt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertionKind {
    Assert,
    Assume,
    Cover,
    AssertProperty,
}

/// A recursive RTL statement, mirroring the constructs the CFG Builder dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// `lhs = rhs;`
    BlockingAssign { lhs: String, rhs: Expr },
    /// `lhs <= rhs;`
    NonblockingAssign { lhs: String, rhs: Expr },
    /// `if (cond) then_branch [else else_branch]`
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    /// `case (selector) items... [default: ...]`
    Case {
        selector: Expr,
        items: Vec<CaseItem>,
        default: Option<Box<Stmt>>,
    },
    /// `for`/`while`/`do-while` — treated uniformly as a single guarded region,
    /// per the design note that inner unrolling is not performed.
    Loop { guard: Expr, body: Box<Stmt> },
    /// `begin ... end`
    Block(Vec<Stmt>),
    /// A timing-control statement (`@(...)`, `#...`) wrapping an inner statement.
    /// Not materialised as its own CFG node unless `inner` is `None`.
    Timing { inner: Option<Box<Stmt>> },
    /// `assert(p);`, `assume(p);`, `cover(p);`, or `assert property(p);`
    Assertion { kind: AssertionKind, predicate: Option<Expr> },
    /// A named property reference that could not be resolved to an expression.
    UnresolvedProperty { name: String },
    /// Any construct this data model does not (yet) represent precisely.
    Unsupported { description: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseItem {
    pub labels: Vec<Expr>,
    pub body: Stmt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// A fixed-width integer literal, e.g. `2'd0`.
    Literal { value: i64, width: Width },
    /// A bare identifier reference, resolved against the current instance's store.
    Ident(String),
    Unary { op: Operator, operand: Box<Expr> },
    Binary { op: Operator, lhs: Box<Expr>, rhs: Box<Expr> },
    /// `cond ? then_expr : else_expr`
    Ternary { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    /// A node kind this data model does not represent; the Expression Translator
    /// falls back to a zero bit-vector of width 32 and logs a warning.
    Unsupported { description: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    pub ports: Vec<Port>,
    pub decls: Vec<Decl>,
    pub continuous_assigns: Vec<ContinuousAssign>,
    pub procedural_blocks: Vec<ProceduralBlock>,
}

/// One concrete elaboration of a module, with its own store namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub module: String,
    pub children: Vec<Instance>,
}

impl Instance {
    /// Recursively collects every instance in this subtree, depth-first, per
    /// the original implementation's nested-instance collection.
    pub fn flatten(&self) -> Vec<&Instance> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Design {
    pub modules: HashMap<String, ModuleDef>,
    pub top: Instance,
}

impl Design {
    pub fn module(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.get(name)
    }

    /// All instances in the design, top-down, depth-first.
    pub fn instances(&self) -> Vec<&Instance> {
        self.top.flatten()
    }
}

/// Supplies an elaborated [`Design`] tree. SystemVerilog parsing/elaboration is an
/// external collaborator; implementors of this trait are that collaborator's adapter.
pub trait Loader {
    fn load(&self, top: &str) -> Result<Design>;
}

/// Reads a serialized [`Design`] tree from a JSON file.
pub struct JsonLoader {
    path: std::path::PathBuf,
}

impl JsonLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl Loader for JsonLoader {
    fn load(&self, top: &str) -> Result<Design> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::DesignLoadFailed(self.path.clone(), Box::new(e))
        })?;
        let design: Design = serde_json::from_str(&text).map_err(|e| {
            Error::DesignLoadFailed(
                self.path.clone(),
                Box::new(CodeFault(Some(self.path.display().to_string()), Box::new(e))),
            )
        })?;
        if !design.modules.contains_key(top) {
            return Err(Error::UnknownTopModule(top.to_string()));
        }
        Ok(design)
    }
}
