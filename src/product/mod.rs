//! The Path Product Generator: combines per-procedural-block path lists into the full
//! per-instance, per-cycle, cross-instance exploration space, per `SPEC_FULL.md` §4.4.
//!
//! Grounded in `engine/execution_engine.py`'s three-level `itertools.product` nesting
//! (single-cycle per module, `N`-fold multi-cycle, cross-module), reimplemented with
//! `itertools::Itertools::multi_cartesian_product` for lazy streaming instead of the
//! original's eager `list(product(...))` materialisation.

use std::collections::HashMap;
use std::iter::Once;
use std::vec::IntoIter;

use itertools::{Itertools, MultiProduct};

use crate::cfg::{Cfg, CfgPath};

/// One path chosen per procedural block, for a single clock cycle.
pub type SingleCyclePaths = Vec<CfgPath>;
/// One [`SingleCyclePaths`] per cycle, `num_cycles` long.
pub type MultiCyclePaths = Vec<SingleCyclePaths>;

/// Python's `itertools.product` yields one empty tuple when multiplying zero factors
/// (`product()` or `product(*[])` both give `[()]`); `itertools::multi_cartesian_product`
/// yields nothing for zero factors instead. This wrapper restores the Python behavior
/// at each of the three product levels below, so `num_cycles = 0` and a no-procedural-
/// block module each still contribute exactly one empty combination rather than
/// collapsing the whole product to zero results.
#[derive(Clone)]
enum OneOrMany<T, I> {
    One(Once<T>),
    Many(I),
}

impl<T, I: Iterator<Item = T>> Iterator for OneOrMany<T, I> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            OneOrMany::One(it) => it.next(),
            OneOrMany::Many(it) => it.next(),
        }
    }
}

type SingleCycleIter = OneOrMany<SingleCyclePaths, MultiProduct<IntoIter<CfgPath>>>;
type MultiCycleIter = OneOrMany<MultiCyclePaths, MultiProduct<SingleCycleIter>>;

/// Lazily enumerates every combination of one path per procedural block within a
/// single cycle, across the always blocks of one instance. A module with no
/// procedural blocks yields exactly one (empty) combination.
pub fn single_cycle_paths(cfgs: &[Cfg]) -> SingleCycleIter {
    if cfgs.is_empty() {
        return OneOrMany::One(std::iter::once(Vec::new()));
    }
    OneOrMany::Many(cfgs.iter().map(|c| c.paths.clone()).multi_cartesian_product())
}

/// Lazily enumerates every `num_cycles`-long sequence of single-cycle combinations,
/// the `N`-fold self-product of [`single_cycle_paths`]. `num_cycles = 0` yields
/// exactly one (empty) combination, per §8's boundary property.
pub fn multi_cycle_paths(cfgs: &[Cfg], num_cycles: usize) -> MultiCycleIter {
    if num_cycles == 0 {
        return OneOrMany::One(std::iter::once(Vec::new()));
    }
    OneOrMany::Many(std::iter::repeat(single_cycle_paths(cfgs)).take(num_cycles).multi_cartesian_product())
}

/// Lazily enumerates every combination of per-instance multi-cycle path choices across
/// all instances in the design, yielding `instance name -> chosen multi-cycle paths`
/// for each combination in the full exploration space. A design with no instances
/// yields exactly one (empty) combination.
pub fn explore<'a>(
    instances: &'a [(String, Vec<Cfg>)],
    num_cycles: usize,
) -> impl Iterator<Item = HashMap<String, MultiCyclePaths>> + 'a {
    let names: Vec<String> = instances.iter().map(|(n, _)| n.clone()).collect();
    if instances.is_empty() {
        return OneOrMany::One(std::iter::once(HashMap::new()));
    }
    OneOrMany::Many(
        instances
            .iter()
            .map(move |(_, cfgs)| multi_cycle_paths(cfgs, num_cycles))
            .multi_cartesian_product()
            .map(move |combo| names.iter().cloned().zip(combo).collect()),
    )
}
