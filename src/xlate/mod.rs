//! Pure converter from an elaborated [`Expr`] to an SMT bit-vector expression.
//!
//! Never mutates the store or the path condition; on an unrecognised node kind,
//! returns a zero bit-vector of width 32 and logs a warning, per §4.2.

use z3::ast::BV;
use z3::Context;

use crate::design::{Expr, Operator};
use crate::smt::{self, Bv, DEFAULT_WIDTH};
use crate::store::{fresh_symbol, Store, SymbolicValue};

/// Translates `expr` in the context of `instance`'s current store bindings.
///
/// Bare identifiers absent from the store are resolved to a fresh symbol of default
/// width; the translator does *not* write that fresh symbol back into the store —
/// callers that want the binding to persist (e.g. the visitor, when the identifier is
/// first read) are responsible for calling [`Store::set`] themselves.
pub fn translate<'ctx>(ctx: &'ctx Context, store: &Store, instance: &str, expr: &Expr) -> Bv<'ctx> {
    match expr {
        Expr::Literal { value, width } => BV::from_i64(ctx, *value, *width),
        Expr::Ident(name) => match store.get(instance, name) {
            Some(v) => value_to_bv(ctx, store, instance, v),
            None => {
                tracing::debug!(instance, name, "unbound identifier, synthesising fresh symbol");
                BV::new_const(ctx, fresh_symbol(), DEFAULT_WIDTH)
            }
        },
        Expr::Unary { op, operand } => {
            let o = translate(ctx, store, instance, operand);
            match op {
                Operator::BitNeg => o.bvnot(),
                Operator::Minus => o.bvneg(),
                Operator::LogicNeg => smt::bool_to_bv(ctx, &smt::bv_to_bool(ctx, &o).not()),
                _ => {
                    tracing::warn!(?op, "unsupported unary operator, falling back to zero bit-vector");
                    BV::from_i64(ctx, 0, DEFAULT_WIDTH)
                }
            }
        }
        Expr::Binary { op, lhs, rhs } => translate_binary(ctx, store, instance, *op, lhs, rhs),
        Expr::Ternary { cond, then_expr, else_expr } => {
            let c = translate(ctx, store, instance, cond);
            let cb = smt::bv_to_bool(ctx, &c);
            let t = translate(ctx, store, instance, then_expr);
            let e = translate(ctx, store, instance, else_expr);
            let (t, e) = smt::match_widths(t, e);
            cb.ite(&t, &e)
        }
        Expr::Unsupported { description } => {
            tracing::warn!(description, "unrecognised expression node, falling back to zero bit-vector");
            BV::from_i64(ctx, 0, DEFAULT_WIDTH)
        }
    }
}

/// Operand widths are zero-extended to a common width before the operator is applied
/// (signals are seeded at their declared widths, so a 1-bit port and a 32-bit reg can
/// meet on either side of an operator; z3 rejects mismatched-width bit-vector ops).
fn translate_binary<'ctx>(
    ctx: &'ctx Context,
    store: &Store,
    instance: &str,
    op: Operator,
    lhs: &Expr,
    rhs: &Expr,
) -> Bv<'ctx> {
    let l = translate(ctx, store, instance, lhs);
    let r = translate(ctx, store, instance, rhs);
    let (l, r) = smt::match_widths(l, r);
    match op {
        Operator::Plus => l.bvadd(&r),
        Operator::Minus => l.bvsub(&r),
        Operator::Mult => l.bvmul(&r),
        Operator::Div => l.bvudiv(&r),
        Operator::Modulus => l.bvurem(&r),
        Operator::BitAnd => l.bvand(&r),
        Operator::BitOr => l.bvor(&r),
        Operator::BitXor => l.bvxor(&r),
        Operator::ShiftL => l.bvshl(&r),
        Operator::ShiftR => l.bvlshr(&r),
        Operator::ArithShiftR => l.bvashr(&r),
        Operator::Lt => smt::bool_to_bv(ctx, &l.bvult(&r)),
        Operator::Lte => smt::bool_to_bv(ctx, &l.bvule(&r)),
        Operator::Gt => smt::bool_to_bv(ctx, &l.bvugt(&r)),
        Operator::Gte => smt::bool_to_bv(ctx, &l.bvuge(&r)),
        Operator::LogicEq => smt::bool_to_bv(ctx, &l._eq(&r)),
        Operator::LogicIneq => smt::bool_to_bv(ctx, &l._eq(&r).not()),
        Operator::LogicAnd => {
            let lb = smt::bv_to_bool(ctx, &l);
            let rb = smt::bv_to_bool(ctx, &r);
            smt::bool_to_bv(ctx, &z3::ast::Bool::and(ctx, &[&lb, &rb]))
        }
        Operator::LogicOr => {
            let lb = smt::bv_to_bool(ctx, &l);
            let rb = smt::bv_to_bool(ctx, &r);
            smt::bool_to_bv(ctx, &z3::ast::Bool::or(ctx, &[&lb, &rb]))
        }
        Operator::BitNeg | Operator::LogicNeg => {
            tracing::warn!(?op, "unary operator used in binary position, falling back to lhs");
            l
        }
    }
}

/// As [`translate`], but produces a boolean directly (guards need this shape for
/// `pc.add`), per the `x != 0` conversion rule.
pub fn translate_bool<'ctx>(
    ctx: &'ctx Context,
    store: &Store,
    instance: &str,
    expr: &Expr,
) -> z3::ast::Bool<'ctx> {
    let bv = translate(ctx, store, instance, expr);
    smt::bv_to_bool(ctx, &bv)
}

/// Exposed crate-wide so the Assertion Checker can re-evaluate a signal's current
/// value under a satisfying model when building a counterexample (§6).
pub(crate) fn value_to_bv<'ctx>(ctx: &'ctx Context, store: &Store, instance: &str, value: &SymbolicValue) -> Bv<'ctx> {
    match value {
        SymbolicValue::Concrete { value, width } => BV::from_i64(ctx, *value, *width),
        SymbolicValue::Symbol { name, width } => BV::new_const(ctx, name.clone(), *width),
        SymbolicValue::Expression { expr, .. } => translate(ctx, store, instance, expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smt::Engine;

    #[test]
    fn literal_translates_to_constant() {
        let engine = Engine::new();
        let ctx = engine.context();
        let store = Store::new();
        let bv = translate(ctx, &store, "top", &Expr::Literal { value: 4, width: 8 });
        assert_eq!(bv.get_size(), 8);
    }

    #[test]
    fn unbound_identifier_becomes_fresh_symbol() {
        let engine = Engine::new();
        let ctx = engine.context();
        let store = Store::new();
        let bv = translate(ctx, &store, "top", &Expr::Ident("x".into()));
        assert_eq!(bv.get_size(), DEFAULT_WIDTH);
    }

    #[test]
    fn unsupported_node_is_zero() {
        let engine = Engine::new();
        let ctx = engine.context();
        let store = Store::new();
        let bv = translate(ctx, &store, "top", &Expr::Unsupported { description: "??".into() });
        let zero = BV::from_i64(ctx, 0, DEFAULT_WIDTH);
        assert_eq!(bv.get_size(), zero.get_size());
    }

    /// A 1-bit port added to a 32-bit register: mismatched-width operands must not
    /// reach z3's `bvadd` as-is.
    #[test]
    fn binary_op_over_mismatched_widths_does_not_panic() {
        let engine = Engine::new();
        let ctx = engine.context();
        let mut store = Store::new();
        store.set("top", "en", SymbolicValue::Concrete { value: 1, width: 1 });
        store.set("top", "count", SymbolicValue::Concrete { value: 5, width: 32 });
        let expr = Expr::Binary {
            op: Operator::Plus,
            lhs: Box::new(Expr::Ident("en".into())),
            rhs: Box::new(Expr::Ident("count".into())),
        };
        let bv = translate(ctx, &store, "top", &expr);
        assert_eq!(bv.get_size(), 32);
    }

    /// A relational result (width-1 under the naive scheme) must compose with a
    /// full-width arithmetic operand.
    #[test]
    fn relational_result_composes_with_full_width_arithmetic() {
        let engine = Engine::new();
        let ctx = engine.context();
        let mut store = Store::new();
        store.set("top", "a", SymbolicValue::Concrete { value: 1, width: 32 });
        store.set("top", "b", SymbolicValue::Concrete { value: 2, width: 32 });
        store.set("top", "c", SymbolicValue::Concrete { value: 3, width: 32 });
        let cmp = Expr::Binary {
            op: Operator::Lt,
            lhs: Box::new(Expr::Ident("a".into())),
            rhs: Box::new(Expr::Ident("b".into())),
        };
        let expr = Expr::Binary { op: Operator::Plus, lhs: Box::new(cmp), rhs: Box::new(Expr::Ident("c".into())) };
        let bv = translate(ctx, &store, "top", &expr);
        assert_eq!(bv.get_size(), 32);
    }

    #[test]
    fn ternary_over_mismatched_branch_widths_does_not_panic() {
        let engine = Engine::new();
        let ctx = engine.context();
        let mut store = Store::new();
        store.set("top", "sel", SymbolicValue::Concrete { value: 1, width: 1 });
        store.set("top", "narrow", SymbolicValue::Concrete { value: 1, width: 1 });
        store.set("top", "wide", SymbolicValue::Concrete { value: 5, width: 32 });
        let expr = Expr::Ternary {
            cond: Box::new(Expr::Ident("sel".into())),
            then_expr: Box::new(Expr::Ident("narrow".into())),
            else_expr: Box::new(Expr::Ident("wide".into())),
        };
        let bv = translate(ctx, &store, "top", &expr);
        assert_eq!(bv.get_size(), 32);
    }
}
