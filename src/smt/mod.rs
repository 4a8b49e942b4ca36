//! Thin binding from the tagged-sum [`crate::store::SymbolicValue`] model onto the
//! `z3` crate's bit-vector theory, plus the push/pop path-condition wrapper.
//!
//! Grounded in the `Rc<Solver<'ctx>>` / scope-counted push-pop idiom found in the
//! retrieval pack's symbolic-execution examples (`cbse-sevm`'s `lib.rs`/`path.rs`) —
//! the only Rust precedent for SMT-backed path conditions in the example pack.

use std::rc::Rc;

use z3::ast::{Ast, Bool, BV};
use z3::{Config, Context, Model, SatResult, Solver};

pub type Bv<'ctx> = BV<'ctx>;

/// Default bit width for unsized intermediates, per the data model.
pub const DEFAULT_WIDTH: u32 = 32;

/// Owns the `z3::Context` for one run. One `Engine` per OS thread, per the
/// concurrency model's "each thread owns its own solver handle" rule.
pub struct Engine {
    ctx: Context,
}

impl Engine {
    pub fn new() -> Self {
        let cfg = Config::new();
        Self { ctx: Context::new(&cfg) }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// The accumulated path condition: an ordered stack of SMT boolean assertions with
/// LIFO checkpoints, per §3/§4.1.
pub struct PathCondition<'ctx> {
    solver: Rc<Solver<'ctx>>,
    depth: usize,
}

impl<'ctx> PathCondition<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self { solver: Rc::new(Solver::new(ctx)), depth: 0 }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn push(&mut self) {
        self.solver.push();
        self.depth += 1;
    }

    pub fn pop(&mut self) {
        debug_assert!(self.depth > 0, "pop without a matching push");
        self.solver.pop(1);
        self.depth -= 1;
    }

    /// Pops back down to `target_depth`, used to recover after abandoning a path
    /// partway through a branch sequence.
    pub fn pop_to(&mut self, target_depth: usize) {
        while self.depth > target_depth {
            self.pop();
        }
    }

    pub fn add(&mut self, expr: &Bool<'ctx>) {
        self.solver.assert(expr);
    }

    /// `sat`/`unsat`/solver-timeout (treated pessimistically as unsat, per §7).
    pub fn check(&self) -> bool {
        matches!(self.solver.check(), SatResult::Sat)
    }

    pub fn model_string(&self) -> Option<String> {
        self.solver.get_model().map(|m| m.to_string())
    }

    /// The satisfying model for the current (checked-sat) state, for plugging
    /// concrete values back into signal names.
    pub fn model(&self) -> Option<Model<'ctx>> {
        self.solver.get_model()
    }
}

/// Converts a bit-vector to a boolean via `x != 0`, per the operator table's rule for
/// combining logical operators (`&& || !`) with bit-vector-typed operands.
pub fn bv_to_bool<'ctx>(ctx: &'ctx Context, bv: &Bv<'ctx>) -> Bool<'ctx> {
    let zero = BV::from_i64(ctx, 0, bv.get_size());
    bv._eq(&zero).not()
}

/// Widens the result to [`DEFAULT_WIDTH`] rather than width 1, so relational/logical
/// results compose with arithmetic on full-width signals without a further width
/// mismatch (mirrors the original's uniform `BitVecVal(_, 32)` treatment).
pub fn bool_to_bv<'ctx>(ctx: &'ctx Context, b: &Bool<'ctx>) -> Bv<'ctx> {
    b.ite(&BV::from_i64(ctx, 1, DEFAULT_WIDTH), &BV::from_i64(ctx, 0, DEFAULT_WIDTH))
}

/// Zero-extends the narrower of `l`/`r` so both share the wider of the two widths.
/// Every binary bit-vector operator requires matching-width operands; signals are
/// seeded at their declared widths (commonly 1, 8, 32, ...), so operand widths are
/// not assumed to already agree.
pub fn match_widths<'ctx>(l: Bv<'ctx>, r: Bv<'ctx>) -> (Bv<'ctx>, Bv<'ctx>) {
    let (lw, rw) = (l.get_size(), r.get_size());
    if lw == rw {
        (l, r)
    } else if lw < rw {
        (l.zero_ext(rw - lw), r)
    } else {
        (l, r.zero_ext(lw - rw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_tracks_depth() {
        let engine = Engine::new();
        let mut pc = PathCondition::new(engine.context());
        assert_eq!(pc.depth(), 0);
        pc.push();
        pc.push();
        assert_eq!(pc.depth(), 2);
        pc.pop();
        assert_eq!(pc.depth(), 1);
        pc.pop_to(0);
        assert_eq!(pc.depth(), 0);
    }

    #[test]
    fn contradiction_is_unsat() {
        let engine = Engine::new();
        let ctx = engine.context();
        let mut pc = PathCondition::new(ctx);
        let a = Bool::new_const(ctx, "a");
        pc.push();
        pc.add(&a);
        pc.add(&a.not());
        assert!(!pc.check());
        pc.pop();
    }
}
