//! The orchestrator: `Execute(N)`, per `SPEC_FULL.md` §2/§4.1.
//!
//! For every instance in the design, every procedural block's CFG is built once.
//! The full cross-instance, multi-cycle path product is then streamed lazily from
//! [`crate::product::explore`]; for each combination the store is reset to fresh
//! symbols, declarations and continuous assignments are applied once, and each
//! instance's chosen path is walked cycle by cycle through [`crate::exec::execute_path`]
//! against one [`PathCondition`] shared for the whole combination and reset to depth
//! zero between combinations, per §5's "solver is reset by pop-to-depth-zero or
//! re-creation."

use std::time::Instant;

use z3::Context;

use crate::cache::Cache;
use crate::config::Config;
use crate::design::Design;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::exec;
use crate::product;
use crate::smt::{Engine as SmtEngine, PathCondition};
use crate::store::{Store, SymbolicValue};
use crate::cfg::{self, Cfg};

/// Everything a completed (or time-budget-aborted) run produced.
pub struct RunReport {
    pub diagnostics: Diagnostics,
    pub combos_explored: u64,
    pub combos_abandoned: u64,
}

/// Builds every instance's procedural-block CFGs once and marks registered decls in
/// a fresh [`Store`] namespace, per §4.2's "CFGs are instance-independent; built once
/// per (module, procedural-block) pair and reused."
fn prepare_instances(design: &Design) -> Result<(Vec<(String, Vec<Cfg>)>, Vec<(String, Vec<String>)>)> {
    let mut per_instance_cfgs = Vec::new();
    let mut registered_decls = Vec::new();
    for instance in design.instances() {
        let module = design.module(&instance.module).ok_or_else(|| {
            Error::InvariantViolation(format!("instance {:?} references unknown module {:?}", instance.name, instance.module))
        })?;
        let mut cfgs = Vec::with_capacity(module.procedural_blocks.len());
        for block in &module.procedural_blocks {
            cfgs.push(cfg::build(&block.body)?);
        }
        per_instance_cfgs.push((instance.name.clone(), cfgs));
        let registered: Vec<String> =
            module.decls.iter().filter(|d| d.is_registered).map(|d| d.name.clone()).collect();
        registered_decls.push((instance.name.clone(), registered));
    }
    Ok((per_instance_cfgs, registered_decls))
}

/// Seeds `store` for the start of one combination: every declared signal (registered
/// or not) gets a fresh symbol of its declared width, then continuous assignments are
/// applied once, per §4.1's documented once-per-combination approximation. Ports are
/// seeded alongside decls so every identifier a procedural block can read already has
/// a fixed symbolic binding before execution starts, rather than each read site
/// synthesising its own (distinct) fresh symbol via the Expression Translator's
/// unbound-identifier fallback.
fn seed_combination(design: &Design, store: &mut Store) {
    for instance in design.instances() {
        store.reset(&instance.name);
        let module = design.module(&instance.module).expect("validated during instance preparation");
        for port in &module.ports {
            store.set(&instance.name, &port.name, SymbolicValue::fresh(port.width));
        }
        for decl in &module.decls {
            store.set(&instance.name, &decl.name, SymbolicValue::fresh(decl.width));
        }
        for assign in &module.continuous_assigns {
            exec::apply_assignment(store, &instance.name, &assign.lhs, &assign.rhs);
        }
    }
}

/// Runs the full bounded symbolic exploration described by `design` and `config`.
pub fn run(design: &Design, config: &Config) -> Result<RunReport> {
    let (per_instance_cfgs, registered_decls) = prepare_instances(design)?;

    let smt = SmtEngine::new();
    let ctx: &Context = smt.context();
    let mut pc = PathCondition::new(ctx);
    let mut store = Store::new();
    for (instance_name, signals) in &registered_decls {
        for signal in signals {
            store.mark_registered(instance_name, signal);
        }
    }
    let mut diagnostics = Diagnostics::new();
    let mut cache = match &config.cache_path {
        Some(path) => Cache::load(path)?,
        None => Cache::in_memory(),
    };

    let started = Instant::now();
    let mut combos_explored = 0u64;
    let mut combos_abandoned = 0u64;

    for combo in product::explore(&per_instance_cfgs, config.num_cycles) {
        if let Some(budget) = config.explore_time {
            if started.elapsed().as_secs() > budget {
                cache.save()?;
                return Err(Error::ExploreTimeExceeded(budget));
            }
        }

        pc.pop_to(0);
        seed_combination(design, &mut store);

        let mut combo_abandoned = false;
        for (instance_name, cfgs) in &per_instance_cfgs {
            let Some(multi_cycle_paths) = combo.get(instance_name) else { continue };
            for (cycle, single_cycle_paths) in multi_cycle_paths.iter().enumerate() {
                for (cfg, path) in cfgs.iter().zip(single_cycle_paths.iter()) {
                    let outcome =
                        exec::execute_path(ctx, &mut pc, &mut store, instance_name, cycle, cfg, path, &mut diagnostics);
                    if outcome == exec::Outcome::Abandoned {
                        combo_abandoned = true;
                    }
                }
            }
        }

        combos_explored += 1;
        if combo_abandoned {
            combos_abandoned += 1;
        }
    }

    cache.save()?;
    Ok(RunReport { diagnostics, combos_explored, combos_abandoned })
}
