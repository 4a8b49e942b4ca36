//! The Assertion Checker: `push; add(¬p); check; record-if-sat; pop`, per
//! `SPEC_FULL.md` §4.6. Never leaves a residual push on the path condition — the
//! check is a side query, not a contribution to the accumulated path.

use z3::{Context, Model};

use crate::cfg::AssertionKind;
use crate::design::Expr;
use crate::diagnostics::{Diagnostics, Violation};
use crate::smt::PathCondition;
use crate::store::Store;
use crate::xlate;

/// Checks one assertion's predicate against the current path condition. Property
/// references that never resolved to an expression (`predicate = None`) are skipped
/// with a warning, per §4.6's "property-reference assertions that cannot be resolved
/// to an expression are ignored with a warning; no state is modified."
#[allow(clippy::too_many_arguments)]
pub fn check<'ctx>(
    ctx: &'ctx Context,
    pc: &mut PathCondition<'ctx>,
    store: &Store,
    instance: &str,
    cycle: usize,
    kind: AssertionKind,
    predicate: Option<&Expr>,
    diagnostics: &mut Diagnostics,
) {
    let Some(predicate) = predicate else {
        diagnostics.warn(format!("{instance}: assertion with unresolved predicate skipped"));
        return;
    };
    let p = xlate::translate_bool(ctx, store, instance, predicate);
    pc.push();
    pc.add(&p.not());
    if pc.check() {
        let model = pc.model().map(|m| model_bindings(ctx, store, instance, &m)).unwrap_or_default();
        diagnostics.record_violation(Violation {
            kind,
            instance: instance.to_string(),
            cycle,
            predicate: format!("{predicate:?}"),
            model,
        });
    }
    pc.pop();
}

/// Plugs `model` back through every signal currently bound for `instance`, producing
/// `signal -> concrete value` pairs rather than the solver's raw symbol dump, per
/// §6's counterexample output shape and §8's "substitute the model into the
/// predicate" property.
fn model_bindings<'ctx>(ctx: &'ctx Context, store: &Store, instance: &str, model: &Model<'ctx>) -> Vec<(String, String)> {
    store
        .signals(instance)
        .map(|(name, value)| {
            let bv = xlate::value_to_bv(ctx, store, instance, value);
            let concrete = model.eval(&bv, true).map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
            (name.to_string(), concrete)
        })
        .collect()
}
