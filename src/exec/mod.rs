//! The Statement Visitor / Executor: walks one chosen [`CfgPath`] for one instance
//! within one cycle, per `SPEC_FULL.md` §4.5.
//!
//! The direction each branch took is read off which basic block actually follows it
//! in the path, matched against that branch node's resolved `*_target` fields (see
//! `crate::cfg`) rather than only the structural direction bit — the bit alone cannot
//! disambiguate a `case` with more than two successors.

use z3::Context;

use crate::assert_check;
use crate::cfg::{Cfg, CfgPath, Node, EXIT};
use crate::design::{Expr, Operator};
use crate::diagnostics::Diagnostics;
use crate::smt::{PathCondition, DEFAULT_WIDTH};
use crate::store::{self, Store, SymbolicValue};
use crate::xlate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The accumulated path condition became unsatisfiable partway through; no
    /// further statements were executed and no state was emitted for this path.
    Abandoned,
}

/// Executes `path` through `cfg`'s basic blocks for `instance` during `cycle`.
///
/// `pc`'s depth on return always equals its depth on entry, regardless of outcome,
/// per the "solver stack depth at exit equals depth at entry" invariant in §8 — every
/// guard pushed while walking a feasible prefix, and any guard left on the stack by
/// an abandoned branch, is unwound here rather than by the caller.
pub fn execute_path<'ctx>(
    ctx: &'ctx Context,
    pc: &mut PathCondition<'ctx>,
    store: &mut Store,
    instance: &str,
    cycle: usize,
    cfg: &Cfg,
    path: &CfgPath,
    diagnostics: &mut Diagnostics,
) -> Outcome {
    let entry_depth = pc.depth();
    let interior = &path.nodes[1..path.nodes.len() - 1];

    for (i, &block_idx) in interior.iter().enumerate() {
        let next = interior.get(i + 1).copied().unwrap_or(EXIT);
        let block = &cfg.basic_blocks[block_idx as usize];

        for node in &block.nodes {
            match node {
                Node::BlockingAssign { lhs, rhs } | Node::NonblockingAssign { lhs, rhs } => {
                    apply_assignment(store, instance, lhs, rhs);
                }
                Node::Assertion { kind, predicate } => {
                    assert_check::check(ctx, pc, store, instance, cycle, *kind, predicate.as_ref(), diagnostics);
                }
                Node::UnresolvedProperty { name } => {
                    diagnostics.warn(format!("{instance}: unresolved property {name:?} skipped"));
                }
                Node::Unsupported { description } => {
                    diagnostics.warn(format!("{instance}: unsupported construct ({description}) skipped"));
                }
                Node::Dummy => {}
                Node::If { cond, then_target, else_target } => {
                    diagnostics.record_branch();
                    let taken_then = resolve_direction(next, *then_target, *else_target, "if");
                    let g = xlate::translate_bool(ctx, store, instance, cond);
                    let guard = if taken_then { g } else { g.not() };
                    if !push_check(pc, &guard) {
                        diagnostics.record_abandoned();
                        pc.pop_to(entry_depth);
                        return Outcome::Abandoned;
                    }
                }
                Node::Loop { guard, body_target, skip_target } => {
                    diagnostics.record_branch();
                    let taken_body = resolve_direction(next, *body_target, *skip_target, "loop");
                    let g = xlate::translate_bool(ctx, store, instance, guard);
                    let cond = if taken_body { g } else { g.not() };
                    if !push_check(pc, &cond) {
                        diagnostics.record_abandoned();
                        pc.pop_to(entry_depth);
                        return Outcome::Abandoned;
                    }
                }
                Node::Case { selector, items, item_targets, default_target } => {
                    diagnostics.record_branch();
                    let guard_expr = case_guard(next, selector, items, item_targets, *default_target);
                    let guard = xlate::translate_bool(ctx, store, instance, &guard_expr);
                    if !push_check(pc, &guard) {
                        diagnostics.record_abandoned();
                        pc.pop_to(entry_depth);
                        return Outcome::Abandoned;
                    }
                }
            }
        }
    }

    pc.pop_to(entry_depth);
    diagnostics.record_path_explored();
    Outcome::Completed
}

fn push_check<'ctx>(pc: &mut PathCondition<'ctx>, guard: &z3::ast::Bool<'ctx>) -> bool {
    pc.push();
    pc.add(guard);
    if pc.check() {
        true
    } else {
        pc.pop();
        false
    }
}

fn resolve_direction(next: isize, positive_target: usize, negative_target: usize, kind: &str) -> bool {
    let next = next as usize;
    if next == positive_target {
        true
    } else if next == negative_target {
        false
    } else {
        unreachable!("{kind} node's successor {next} matches neither resolved target")
    }
}

/// Builds the guard expression for a `case` arm: the disjunction of `selector ==
/// label` over the taken item's labels, or — for the default arm — the conjunction
/// of `selector != label` over every label in every item, per §4.5.
fn case_guard(
    next: isize,
    selector: &Expr,
    items: &[Vec<Expr>],
    item_targets: &[usize],
    default_target: Option<usize>,
) -> Expr {
    let next = next as usize;
    if let Some(pos) = item_targets.iter().position(|t| *t == next) {
        disjoin(items[pos].iter().map(|label| equality(selector, label)))
    } else if default_target == Some(next) {
        conjoin(items.iter().flatten().map(|label| negate(equality(selector, label))))
    } else {
        unreachable!("case node's successor {next} matches no resolved item or default target")
    }
}

fn equality(selector: &Expr, label: &Expr) -> Expr {
    Expr::Binary { op: Operator::LogicEq, lhs: Box::new(selector.clone()), rhs: Box::new(label.clone()) }
}

fn negate(expr: Expr) -> Expr {
    Expr::Unary { op: Operator::LogicNeg, operand: Box::new(expr) }
}

fn disjoin(mut exprs: impl Iterator<Item = Expr>) -> Expr {
    let first = exprs.next().unwrap_or(Expr::Literal { value: 0, width: 1 });
    exprs.fold(first, |a, b| Expr::Binary { op: Operator::LogicOr, lhs: Box::new(a), rhs: Box::new(b) })
}

fn conjoin(mut exprs: impl Iterator<Item = Expr>) -> Expr {
    let first = exprs.next().unwrap_or(Expr::Literal { value: 1, width: 1 });
    exprs.fold(first, |a, b| Expr::Binary { op: Operator::LogicAnd, lhs: Box::new(a), rhs: Box::new(b) })
}

/// Blocking and nonblocking assignments are given identical (immediate-update)
/// semantics, per §4.5/§9's documented approximation. Also used directly for
/// continuous assignments, which follow the same substitution rule.
pub fn apply_assignment(store: &mut Store, instance: &str, lhs: &str, rhs: &Expr) {
    match rhs {
        Expr::Literal { value, width } => {
            store.set(instance, lhs, SymbolicValue::Concrete { value: *value, width: *width });
        }
        Expr::Ident(name) => {
            let aliased = store.get(instance, name).cloned().unwrap_or_else(SymbolicValue::fresh_default_width);
            store.set(instance, lhs, aliased);
        }
        other => {
            let substituted = store::substitute(other, store, instance);
            store.set(instance, lhs, SymbolicValue::Expression { expr: Box::new(substituted), width: DEFAULT_WIDTH });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{self, ENTRY};
    use crate::design::Stmt;
    use crate::smt::Engine;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    fn lit(v: i64) -> Expr {
        Expr::Literal { value: v, width: 32 }
    }

    /// `if (en) count <= count + 1;`: taking the then-branch stores a fresh symbolic
    /// expression for `count`; taking the else-branch leaves the store untouched.
    #[test]
    fn conditional_counter_then_path_updates_store() {
        let body = Stmt::If {
            cond: ident("en"),
            then_branch: Box::new(Stmt::NonblockingAssign {
                lhs: "count".into(),
                rhs: Expr::Binary { op: Operator::Plus, lhs: Box::new(ident("count")), rhs: Box::new(lit(1)) },
            }),
            else_branch: None,
        };
        let cfg = cfg::build(&body).unwrap();
        let then_path = cfg.paths.iter().find(|p| p.nodes == vec![ENTRY, 0, 1, cfg::EXIT]).unwrap();

        let engine = Engine::new();
        let ctx = engine.context();
        let mut pc = PathCondition::new(ctx);
        let mut store = Store::new();
        store.set("top", "en", SymbolicValue::Concrete { value: 1, width: 1 });
        store.set("top", "count", SymbolicValue::fresh_default_width());
        let mut diag = Diagnostics::new();

        let outcome = execute_path(ctx, &mut pc, &mut store, "top", 0, &cfg, then_path, &mut diag);
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(pc.depth(), 0);
        assert!(matches!(store.get("top", "count"), Some(SymbolicValue::Expression { .. })));
    }

    /// Two sibling `if(a)`/`if(!a)`: the then/then combination contradicts `a ∧ ¬a`
    /// and must be abandoned; the then/else and else/then combinations are feasible.
    #[test]
    fn mutually_exclusive_sibling_branches() {
        let body = Stmt::Block(vec![
            Stmt::If {
                cond: ident("a"),
                then_branch: Box::new(Stmt::BlockingAssign { lhs: "x".into(), rhs: lit(1) }),
                else_branch: Some(Box::new(Stmt::BlockingAssign { lhs: "x".into(), rhs: lit(0) })),
            },
            Stmt::If {
                cond: Expr::Unary { op: Operator::LogicNeg, operand: Box::new(ident("a")) },
                then_branch: Box::new(Stmt::BlockingAssign { lhs: "y".into(), rhs: lit(1) }),
                else_branch: Some(Box::new(Stmt::BlockingAssign { lhs: "y".into(), rhs: lit(0) })),
            },
        ]);
        let cfg = cfg::build(&body).unwrap();
        assert_eq!(cfg.paths.len(), 4);

        let engine = Engine::new();
        let ctx = engine.context();
        let mut outcomes = Vec::new();
        for path in &cfg.paths {
            let mut pc = PathCondition::new(ctx);
            let mut store = Store::new();
            store.set("top", "a", SymbolicValue::fresh(1));
            let mut diag = Diagnostics::new();
            let outcome = execute_path(ctx, &mut pc, &mut store, "top", 0, &cfg, path, &mut diag);
            assert_eq!(pc.depth(), 0);
            outcomes.push(outcome);
        }
        let abandoned = outcomes.iter().filter(|o| **o == Outcome::Abandoned).count();
        let completed = outcomes.iter().filter(|o| **o == Outcome::Completed).count();
        assert_eq!(abandoned, 1, "exactly the then/then combination contradicts a ∧ ¬a");
        assert_eq!(completed, 3);
    }

    /// `case (sel) 2'd0: y<=a; 2'd1: y<=b; default: y<=c; endcase`: the `sel == 0`
    /// path stores `y` aliased to `a`'s symbolic value.
    #[test]
    fn case_with_default_selects_matching_arm() {
        use crate::design::CaseItem;
        let body = Stmt::Case {
            selector: ident("sel"),
            items: vec![
                CaseItem { labels: vec![lit(0)], body: Stmt::NonblockingAssign { lhs: "y".into(), rhs: ident("a") } },
                CaseItem { labels: vec![lit(1)], body: Stmt::NonblockingAssign { lhs: "y".into(), rhs: ident("b") } },
            ],
            default: Some(Box::new(Stmt::NonblockingAssign { lhs: "y".into(), rhs: ident("c") })),
        };
        let cfg = cfg::build(&body).unwrap();
        assert_eq!(cfg.paths.len(), 3);

        let engine = Engine::new();
        let ctx = engine.context();
        let a_value = SymbolicValue::Symbol { name: "a_sym".into(), width: 32 };

        let mut matched_zero = false;
        for path in &cfg.paths {
            let mut pc = PathCondition::new(ctx);
            let mut store = Store::new();
            store.set("top", "sel", SymbolicValue::Concrete { value: 0, width: 32 });
            store.set("top", "a", a_value.clone());
            let mut diag = Diagnostics::new();
            let outcome = execute_path(ctx, &mut pc, &mut store, "top", 0, &cfg, path, &mut diag);
            if outcome == Outcome::Completed && store.get("top", "y") == Some(&a_value) {
                matched_zero = true;
            }
            assert_eq!(pc.depth(), 0);
        }
        assert!(matched_zero, "the sel=0 path's final store must alias y to a's value");
    }
}
