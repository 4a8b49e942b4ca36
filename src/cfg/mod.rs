//! Lifts a single procedural block's body into a control-flow graph of basic blocks
//! and enumerates its simple entry-to-exit paths.
//!
//! Grounded in `engine/cfg.py`'s `basic_blocks_sv`/`partition`/`build_cfg` (the
//! authoritative partition-point bookkeeping, dummy-node insertion on empty branches,
//! and case/loop handling), reimplemented over the arena graph in
//! [`crate::util::graph::Graph`] instead of `networkx`. Two deviations from the
//! original are recorded in `DESIGN.md` and `SPEC_FULL.md` §4.3/§9:
//!
//! - basic-block partitioning uses the uniform half-open rule
//!   `block[i] = all_nodes[partition[i]..partition[i+1])`, not the original's
//!   asymmetric first-block rule;
//! - sibling branch points fall through to whatever follows them in the same
//!   enclosing block (standard structured CFG construction) instead of the
//!   original's ad hoc cross-edging of independent branch points.

use std::collections::{BTreeSet, HashMap};

use crate::design::{CaseItem, Expr, Stmt};
use crate::error::{Error, Result};
use crate::util::graph::Graph;

pub use crate::design::AssertionKind;

/// One node in the flat, depth-first-ordered statement list. Branch nodes carry the
/// resolved basic-block index of each outgoing edge directly (rather than only a
/// structural direction bit), since a `case` may have more than two successors that a
/// single bit cannot disambiguate; the Statement Visitor (`exec`) matches the actual
/// next block in a chosen path against these targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    BlockingAssign { lhs: String, rhs: Expr },
    NonblockingAssign { lhs: String, rhs: Expr },
    If { cond: Expr, then_target: usize, else_target: usize },
    Case { selector: Expr, items: Vec<Vec<Expr>>, item_targets: Vec<usize>, default_target: Option<usize> },
    /// Treated as a binary conditional: `body_target` gates entry, `skip_target`
    /// continuation, per `SPEC_FULL.md` §4.5. No inner unrolling.
    Loop { guard: Expr, body_target: usize, skip_target: usize },
    Assertion { kind: AssertionKind, predicate: Option<Expr> },
    UnresolvedProperty { name: String },
    Unsupported { description: String },
    /// A synthetic node with no RTL content: an empty branch body, or the
    /// "don't take this branch" destination when no `else` was written.
    Dummy,
}

/// A maximal run of non-branching statements plus the closing branch statement.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub nodes: Vec<Node>,
}

/// `path[0]` and `path.last()` are always the dummy entry/exit sentinels.
pub const ENTRY: isize = -1;
pub const EXIT: isize = -2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgPath {
    /// `ENTRY`, then a sequence of basic-block indices, then `EXIT`.
    pub nodes: Vec<isize>,
    /// Length equals `nodes.len() - 3` (one bit per consecutive pair of *real*
    /// basic blocks, excluding the entry/exit sentinels); bit `i` is 1 iff
    /// `nodes[i+2] == nodes[i+1] + 1`. Reported for determinism/diagnostics per
    /// `SPEC_FULL.md` §3; the Statement Visitor resolves which branch was actually
    /// taken via each node's own `*_target` fields, not this bit, so it remains
    /// correct even for `case`'s more-than-two-way branches.
    pub direction: Vec<u8>,
}

pub struct Cfg {
    pub basic_blocks: Vec<BasicBlock>,
    pub paths: Vec<CfgPath>,
}

struct Builder {
    all_nodes: Vec<Node>,
    partition_points: BTreeSet<usize>,
    /// Edges between flat node indices, mapped to basic-block edges after partitioning.
    edges: Vec<(usize, usize)>,
}

impl Builder {
    fn new() -> Self {
        let mut partition_points = BTreeSet::new();
        partition_points.insert(0);
        Self { all_nodes: Vec::new(), partition_points, edges: Vec::new() }
    }

    fn push(&mut self, node: Node) -> usize {
        let idx = self.all_nodes.len();
        self.all_nodes.push(node);
        idx
    }

    fn mark(&mut self, idx: usize) {
        self.partition_points.insert(idx);
    }

    /// Walks a sequence of sibling statements (a `begin/end` body, or a procedural
    /// block's top-level body), connecting each statement's exit tails to the next
    /// statement's entry — standard structured fall-through.
    fn walk_seq(&mut self, stmts: &[Stmt]) -> (usize, Vec<usize>) {
        if stmts.is_empty() {
            let idx = self.push(Node::Dummy);
            return (idx, vec![idx]);
        }
        let mut start = None;
        let mut tails: Vec<usize> = Vec::new();
        for stmt in stmts {
            let (this_start, this_tails) = self.walk_one(stmt);
            if start.is_none() {
                start = Some(this_start);
            }
            for t in &tails {
                self.edges.push((*t, this_start));
            }
            tails = this_tails;
        }
        (start.unwrap(), tails)
    }

    /// Walks one statement, returning its entry node index and its set of open exit
    /// tails (nodes whose successor, if any, is whatever follows in the enclosing
    /// sequence).
    fn walk_one(&mut self, stmt: &Stmt) -> (usize, Vec<usize>) {
        match stmt {
            Stmt::Block(items) => self.walk_seq(items),
            Stmt::Timing { inner } => match inner {
                Some(s) => self.walk_one(s),
                None => {
                    let idx = self.push(Node::Dummy);
                    (idx, vec![idx])
                }
            },
            Stmt::BlockingAssign { lhs, rhs } => {
                let idx = self.push(Node::BlockingAssign { lhs: lhs.clone(), rhs: rhs.clone() });
                (idx, vec![idx])
            }
            Stmt::NonblockingAssign { lhs, rhs } => {
                let idx = self.push(Node::NonblockingAssign { lhs: lhs.clone(), rhs: rhs.clone() });
                (idx, vec![idx])
            }
            Stmt::Assertion { kind, predicate } => {
                let idx = self.push(Node::Assertion { kind: *kind, predicate: predicate.clone() });
                (idx, vec![idx])
            }
            Stmt::UnresolvedProperty { name } => {
                let idx = self.push(Node::UnresolvedProperty { name: name.clone() });
                (idx, vec![idx])
            }
            Stmt::Unsupported { description } => {
                let idx = self.push(Node::Unsupported { description: description.clone() });
                (idx, vec![idx])
            }
            Stmt::If { cond, then_branch, else_branch } => {
                let parent_idx = self.push(Node::If { cond: cond.clone(), then_target: 0, else_target: 0 });
                self.mark(parent_idx);
                let tails = self.wire_if(parent_idx, then_branch, else_branch.as_deref());
                (parent_idx, tails)
            }
            Stmt::Case { selector, items, default } => {
                let idx = self.push(Node::Case {
                    selector: selector.clone(),
                    items: items.iter().map(|i| i.labels.clone()).collect(),
                    item_targets: Vec::new(),
                    default_target: None,
                });
                self.mark(idx);
                let mut tails = Vec::new();
                for item in items {
                    let (start, t) = self.walk_one(&item.body);
                    self.mark(start);
                    self.edges.push((idx, start));
                    tails.extend(t);
                }
                if let Some(def) = default {
                    let (start, t) = self.walk_one(def);
                    self.mark(start);
                    self.edges.push((idx, start));
                    tails.extend(t);
                }
                (idx, tails)
            }
            Stmt::Loop { guard, body } => {
                let idx = self.push(Node::Loop { guard: guard.clone(), body_target: 0, skip_target: 0 });
                self.mark(idx);
                let (body_start, body_tails) = self.walk_one(body);
                self.mark(body_start);
                self.edges.push((idx, body_start));
                let skip_idx = self.push(Node::Dummy);
                self.mark(skip_idx);
                self.edges.push((idx, skip_idx));
                let mut tails = body_tails;
                tails.push(skip_idx);
                (idx, tails)
            }
        }
    }

    /// Wires the then/else-if/else chain for an `if` whose node has already been
    /// pushed at `parent_idx` (mirrors `_process_conditional_sv`'s handling of nested
    /// else-if, where the nested conditional's node is pushed by the caller).
    fn wire_if(&mut self, parent_idx: usize, then_branch: &Stmt, else_branch: Option<&Stmt>) -> Vec<usize> {
        let (then_start, then_tails) = self.walk_one(then_branch);
        self.mark(then_start);
        self.edges.push((parent_idx, then_start));
        let mut tails = then_tails;
        match else_branch {
            None => {
                let dummy_idx = self.push(Node::Dummy);
                self.mark(dummy_idx);
                self.edges.push((parent_idx, dummy_idx));
                tails.push(dummy_idx);
            }
            Some(Stmt::If { cond, then_branch: t2, else_branch: e2 }) => {
                let nested_idx = self.push(Node::If { cond: cond.clone(), then_target: 0, else_target: 0 });
                self.mark(nested_idx);
                self.edges.push((parent_idx, nested_idx));
                let nested_tails = self.wire_if(nested_idx, t2, e2.as_deref());
                tails.extend(nested_tails);
            }
            Some(other) => {
                let (else_start, else_tails) = self.walk_one(other);
                self.mark(else_start);
                self.edges.push((parent_idx, else_start));
                tails.extend(else_tails);
            }
        }
        tails
    }

    /// Finds the basic-block index containing flat node `idx`, by binary search over
    /// the sorted partition-point array (no trailing sentinel).
    fn find_block(points: &[usize], idx: usize) -> usize {
        match points.binary_search(&idx) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// Patches every branch node's `*_target` fields with the resolved basic-block
    /// index of each outgoing edge, in the order those edges were recorded (which is
    /// exactly then/else, item-by-item-then-default, or body/skip).
    fn resolve_branch_targets(&mut self, points: &[usize]) {
        let mut out_edges: HashMap<usize, Vec<usize>> = HashMap::new();
        for (s, t) in &self.edges {
            out_edges.entry(*s).or_default().push(Self::find_block(points, *t));
        }
        for (idx, node) in self.all_nodes.iter_mut().enumerate() {
            let targets = out_edges.get(&idx);
            match node {
                Node::If { then_target, else_target, .. } => {
                    let t = targets.expect("if node missing then/else edges");
                    *then_target = t[0];
                    *else_target = t[1];
                }
                Node::Case { items, item_targets, default_target, .. } => {
                    let t = targets.cloned().unwrap_or_default();
                    let n = items.len();
                    *item_targets = t.get(..n).map(|s| s.to_vec()).unwrap_or_default();
                    *default_target = t.get(n).copied();
                }
                Node::Loop { body_target, skip_target, .. } => {
                    let t = targets.expect("loop node missing body/skip edges");
                    *body_target = t[0];
                    *skip_target = t[1];
                }
                _ => {}
            }
        }
    }

    fn partition(&self) -> Vec<BasicBlock> {
        let mut points: Vec<usize> = self.partition_points.iter().copied().collect();
        points.push(self.all_nodes.len());
        let mut blocks = Vec::with_capacity(points.len().saturating_sub(1));
        for w in points.windows(2) {
            let (start, end) = (w[0], w[1]);
            blocks.push(BasicBlock { nodes: self.all_nodes[start..end].to_vec() });
        }
        blocks
    }
}

/// Builds the CFG for one procedural block's body.
pub fn build(body: &Stmt) -> Result<Cfg> {
    let mut builder = Builder::new();
    let stmts: Vec<Stmt> = match body {
        Stmt::Block(items) => items.clone(),
        other => vec![other.clone()],
    };
    builder.walk_seq(&stmts);

    let points: Vec<usize> = builder.partition_points.iter().copied().collect();
    builder.resolve_branch_targets(&points);
    let basic_blocks = builder.partition();

    let mut graph = Graph::with_capacity(basic_blocks.len() + 2, builder.edges.len() + basic_blocks.len());
    let entry_gi = graph.add_node();
    for _ in 0..basic_blocks.len() {
        graph.add_node();
    }
    let exit_gi = graph.add_node();
    let block_gi = |b: usize| -> usize { b + 1 };

    for (a, b) in &builder.edges {
        let ba = Builder::find_block(&points, *a);
        let bb = Builder::find_block(&points, *b);
        if ba != bb {
            graph.add_edge(block_gi(ba), block_gi(bb));
        }
    }
    graph.add_edge(entry_gi, block_gi(0));
    for b in 0..basic_blocks.len() {
        if graph.out_degree(block_gi(b)) == 0 {
            graph.add_edge(block_gi(b), exit_gi);
        }
    }
    if basic_blocks.is_empty() {
        return Err(Error::InvariantViolation("CFG built with zero basic blocks".into()));
    }

    let raw_paths = enumerate_simple_paths(&graph, entry_gi, exit_gi);
    let paths = raw_paths
        .into_iter()
        .map(|gpath| {
            let nodes: Vec<isize> = gpath
                .iter()
                .map(|gi| {
                    if *gi == entry_gi {
                        ENTRY
                    } else if *gi == exit_gi {
                        EXIT
                    } else {
                        (*gi - 1) as isize
                    }
                })
                .collect();
            let direction = direction_vector(&nodes);
            CfgPath { nodes, direction }
        })
        .collect();

    Ok(Cfg { basic_blocks, paths })
}

fn direction_vector(nodes: &[isize]) -> Vec<u8> {
    // Interior (real) blocks occupy nodes[1..nodes.len()-1]; only compare consecutive
    // pairs within that range, never against the ENTRY/EXIT sentinels at the ends.
    let mut bits = Vec::new();
    if nodes.len() < 4 {
        return bits;
    }
    for i in 1..nodes.len() - 2 {
        bits.push(if nodes[i] + 1 == nodes[i + 1] { 1 } else { 0 });
    }
    bits
}

/// Enumerates all simple paths from `source` to `target` via iterative DFS with a
/// visited set, replacing the original's `networkx.all_simple_paths`, per
/// `SPEC_FULL.md` §9. Tie-breaks deterministically by ascending successor index, so
/// that repeated runs on the same CFG enumerate paths in the same order.
fn enumerate_simple_paths(graph: &Graph, source: usize, target: usize) -> Vec<Vec<usize>> {
    let mut results = Vec::new();
    let mut path = vec![source];
    let mut visited = vec![false; graph.node_count()];
    visited[source] = true;
    let mut stack: Vec<Vec<usize>> = vec![{
        let mut succ: Vec<usize> = graph.successors(source).collect();
        succ.sort_unstable();
        succ
    }];

    while let Some(frame) = stack.last_mut() {
        if let Some(next) = frame.pop() {
            if next == target {
                let mut complete = path.clone();
                complete.push(target);
                results.push(complete);
                continue;
            }
            if visited[next] {
                continue;
            }
            visited[next] = true;
            path.push(next);
            let mut succ: Vec<usize> = graph.successors(next).collect();
            succ.sort_unstable();
            stack.push(succ);
        } else {
            stack.pop();
            if let Some(last) = path.pop() {
                visited[last] = false;
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Operator;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    fn lit(v: i64) -> Expr {
        Expr::Literal { value: v, width: 32 }
    }

    /// `always_ff @(posedge clk) q <= d;` — a single leaf statement.
    #[test]
    fn pass_through_register_has_one_path() {
        let body = Stmt::NonblockingAssign { lhs: "q".into(), rhs: ident("d") };
        let cfg = build(&body).unwrap();
        assert_eq!(cfg.basic_blocks.len(), 1);
        assert_eq!(cfg.paths.len(), 1);
        assert_eq!(cfg.paths[0].nodes, vec![ENTRY, 0, EXIT]);
        assert!(cfg.paths[0].direction.is_empty());
    }

    /// `if (en) count <= count + 1;` with no else: two feasible paths (take/skip).
    #[test]
    fn conditional_with_no_else_has_two_paths() {
        let body = Stmt::If {
            cond: ident("en"),
            then_branch: Box::new(Stmt::NonblockingAssign {
                lhs: "count".into(),
                rhs: Expr::Binary { op: Operator::Plus, lhs: Box::new(ident("count")), rhs: Box::new(lit(1)) },
            }),
            else_branch: None,
        };
        let cfg = build(&body).unwrap();
        assert_eq!(cfg.paths.len(), 2);
        // The if node (block 0) must have resolved then/else targets pointing at
        // two distinct, valid basic blocks.
        match &cfg.basic_blocks[0].nodes[0] {
            Node::If { then_target, else_target, .. } => {
                assert_ne!(then_target, else_target);
                assert!(*then_target < cfg.basic_blocks.len());
                assert!(*else_target < cfg.basic_blocks.len());
            }
            other => panic!("expected Node::If, got {other:?}"),
        }
    }

    /// Two sibling `if`s in the same block: four feasible top-level combinations
    /// (then-then, then-else, else-then, else-else) via structured fall-through.
    #[test]
    fn sibling_conditionals_combine_via_fallthrough() {
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
        let cfg = build(&body).unwrap();
        assert_eq!(cfg.paths.len(), 4);
    }

    /// `if (x==0) y<=1; else if (x==1) y<=2; else y<=3;` — three feasible paths.
    #[test]
    fn else_if_chain_has_three_paths() {
        let body = Stmt::If {
            cond: Expr::Binary { op: Operator::LogicEq, lhs: Box::new(ident("x")), rhs: Box::new(lit(0)) },
            then_branch: Box::new(Stmt::NonblockingAssign { lhs: "y".into(), rhs: lit(1) }),
            else_branch: Some(Box::new(Stmt::If {
                cond: Expr::Binary { op: Operator::LogicEq, lhs: Box::new(ident("x")), rhs: Box::new(lit(1)) },
                then_branch: Box::new(Stmt::NonblockingAssign { lhs: "y".into(), rhs: lit(2) }),
                else_branch: Some(Box::new(Stmt::NonblockingAssign { lhs: "y".into(), rhs: lit(3) })),
            })),
        };
        let cfg = build(&body).unwrap();
        assert_eq!(cfg.paths.len(), 3);
    }

    /// `case (sel) 2'd0: y<=a; 2'd1: y<=b; default: y<=c; endcase` — three paths.
    #[test]
    fn case_with_default_has_three_paths() {
        let body = Stmt::Case {
            selector: ident("sel"),
            items: vec![
                CaseItem { labels: vec![lit(0)], body: Stmt::NonblockingAssign { lhs: "y".into(), rhs: ident("a") } },
                CaseItem { labels: vec![lit(1)], body: Stmt::NonblockingAssign { lhs: "y".into(), rhs: ident("b") } },
            ],
            default: Some(Box::new(Stmt::NonblockingAssign { lhs: "y".into(), rhs: ident("c") })),
        };
        let cfg = build(&body).unwrap();
        assert_eq!(cfg.paths.len(), 3);
        match &cfg.basic_blocks[0].nodes[0] {
            Node::Case { item_targets, default_target, .. } => {
                assert_eq!(item_targets.len(), 2);
                assert!(default_target.is_some());
                let mut all = item_targets.clone();
                all.push(default_target.unwrap());
                all.sort_unstable();
                all.dedup();
                assert_eq!(all.len(), 3, "all three case targets must be distinct blocks");
            }
            other => panic!("expected Node::Case, got {other:?}"),
        }
    }

    #[test]
    fn every_node_belongs_to_exactly_one_block() {
        let body = Stmt::Block(vec![
            Stmt::BlockingAssign { lhs: "a".into(), rhs: lit(0) },
            Stmt::If {
                cond: ident("c"),
                then_branch: Box::new(Stmt::BlockingAssign { lhs: "b".into(), rhs: lit(1) }),
                else_branch: None,
            },
        ]);
        let cfg = build(&body).unwrap();
        let total: usize = cfg.basic_blocks.iter().map(|b| b.nodes.len()).sum();
        // every path is simple and visits valid interior indices only
        for path in &cfg.paths {
            assert_eq!(path.nodes.first(), Some(&ENTRY));
            assert_eq!(path.nodes.last(), Some(&EXIT));
            let interior = &path.nodes[1..path.nodes.len() - 1];
            let mut seen = std::collections::HashSet::new();
            for &b in interior {
                assert!(b >= 0 && (b as usize) < cfg.basic_blocks.len());
                assert!(seen.insert(b), "simple path must not repeat a block");
            }
        }
        assert!(total > 0);
    }
}
