//! The symbolic store: a two-level `instance -> signal -> SymbolicValue` mapping,
//! the fresh-symbol generator, and the reset/merge discipline applied between paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::design::Expr;
use crate::smt::DEFAULT_WIDTH;

/// Monotonically unique opaque symbol names, collision-free by construction (a
/// process-wide counter rather than the original's random-string generator, since a
/// counter gives the same collision-freedom with no collision-checking needed).
static SYMBOL_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn fresh_symbol() -> String {
    let n = SYMBOL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("sym!{n}")
}

/// A tagged-sum store value, per the design note preferring this over string
/// concatenation: concrete literal, opaque fresh symbol, or a structured expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicValue {
    Concrete { value: i64, width: u32 },
    Symbol { name: String, width: u32 },
    Expression { expr: Box<Expr>, width: u32 },
}

impl SymbolicValue {
    pub fn width(&self) -> u32 {
        match self {
            SymbolicValue::Concrete { width, .. } => *width,
            SymbolicValue::Symbol { width, .. } => *width,
            SymbolicValue::Expression { width, .. } => *width,
        }
    }

    pub fn fresh(width: u32) -> Self {
        SymbolicValue::Symbol { name: fresh_symbol(), width }
    }

    pub fn fresh_default_width() -> Self {
        Self::fresh(DEFAULT_WIDTH)
    }

    /// Renders this value back to an [`Expr`] so it can be substituted into a larger
    /// expression, e.g. when aliasing `lhs = some_identifier`.
    pub fn as_expr(&self) -> Expr {
        match self {
            SymbolicValue::Concrete { value, width } => Expr::Literal { value: *value, width: *width },
            SymbolicValue::Symbol { name, .. } => Expr::Ident(name.clone()),
            SymbolicValue::Expression { expr, .. } => (**expr).clone(),
        }
    }
}

/// `instance -> signal -> value`. Insertion order is irrelevant; each signal appears
/// at most once per instance.
#[derive(Debug, Default)]
pub struct Store {
    instances: HashMap<String, HashMap<String, SymbolicValue>>,
    /// Signals known to be registered (flip-flop) outputs, carried forward across a
    /// reset rather than reseeded with a fresh symbol. Populated once at instance
    /// discovery from `Decl::is_registered`.
    registered: HashMap<String, Vec<String>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_registered(&mut self, instance: &str, signal: &str) {
        self.registered.entry(instance.to_string()).or_default().push(signal.to_string());
    }

    pub fn get(&self, instance: &str, signal: &str) -> Option<&SymbolicValue> {
        self.instances.get(instance)?.get(signal)
    }

    /// Every signal currently bound for `instance`, used to plug a satisfying model
    /// back into signal names for a counterexample report (§6's `signal -> concrete
    /// value` output shape).
    pub fn signals(&self, instance: &str) -> impl Iterator<Item = (&str, &SymbolicValue)> {
        self.instances.get(instance).into_iter().flatten().map(|(k, v)| (k.as_str(), v))
    }

    pub fn set(&mut self, instance: &str, signal: &str, value: SymbolicValue) {
        self.instances.entry(instance.to_string()).or_default().insert(signal.to_string(), value);
    }

    /// Clears the store for `instance`, carrying forward registered signals' final
    /// values from the previous path as the new cycle's initial value, per §4.1's
    /// reset discipline. Everything else is left to be reseeded by the caller
    /// (fresh symbols for inputs, re-execution of decls/continuous assigns).
    pub fn reset(&mut self, instance: &str) {
        let carried: Vec<(String, SymbolicValue)> = self
            .registered
            .get(instance)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| self.instances.get(instance)?.get(n).cloned().map(|v| (n.clone(), v)))
                    .collect()
            })
            .unwrap_or_default();
        self.instances.remove(instance);
        for (name, value) in carried {
            self.set(instance, &name, value);
        }
    }

    /// Merges `prev`'s registered-signal bindings for `instance` into `self`, used
    /// when a fresh [`Store`] is built for the next cycle rather than reset in place.
    pub fn merge(&mut self, prev: &Store, instance: &str) {
        if let Some(names) = prev.registered.get(instance) {
            for name in names {
                if let Some(v) = prev.get(instance, name).cloned() {
                    self.set(instance, name, v);
                }
                self.mark_registered(instance, name);
            }
        }
    }
}

/// Converts a binary/unary RTL operator on SMT-bit-vector-typed operands into the
/// same operator applied at the [`Expr`] tree level, used by the visitor when it
/// substitutes variable names for their current symbolic values (§4.5's "otherwise
/// substitute" rule). Kept as plain data-driven composition; no I/O.
pub fn substitute(expr: &Expr, store: &Store, instance: &str) -> Expr {
    match expr {
        Expr::Ident(name) => match store.get(instance, name) {
            Some(v) => v.as_expr(),
            None => Expr::Ident(name.clone()),
        },
        Expr::Unary { op, operand } => {
            Expr::Unary { op: *op, operand: Box::new(substitute(operand, store, instance)) }
        }
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(substitute(lhs, store, instance)),
            rhs: Box::new(substitute(rhs, store, instance)),
        },
        Expr::Ternary { cond, then_expr, else_expr } => Expr::Ternary {
            cond: Box::new(substitute(cond, store, instance)),
            then_expr: Box::new(substitute(then_expr, store, instance)),
            else_expr: Box::new(substitute(else_expr, store, instance)),
        },
        Expr::Literal { .. } | Expr::Unsupported { .. } => expr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_symbols_are_unique() {
        let a = fresh_symbol();
        let b = fresh_symbol();
        assert_ne!(a, b);
    }

    #[test]
    fn reset_carries_forward_registered_signals() {
        let mut store = Store::new();
        store.mark_registered("top", "q");
        store.set("top", "q", SymbolicValue::Symbol { name: "sym!0".into(), width: 32 });
        store.set("top", "scratch", SymbolicValue::Concrete { value: 0, width: 32 });
        store.reset("top");
        assert!(store.get("top", "scratch").is_none());
        assert_eq!(
            store.get("top", "q"),
            Some(&SymbolicValue::Symbol { name: "sym!0".into(), width: 32 })
        );
    }
}
