//! Fixpoint solver (spec §4.4–§4.6)
//!
//! Seeds constants, computes SCCs, then for each SCC in ascending (reverse
//! topological) order runs the trivial case or the widen/narrow pair,
//! finally clamping every range to its declared integer type (§4.7).
//!
//! Borrow note: several helpers here read three `Graph` fields (`ranges`,
//! `constants`, `value_types`) through a `FieldLookup` while mutating a
//! fourth (`constraints`) in the same scope. These are disjoint fields of
//! the same struct, accessed directly rather than through a `&mut self`
//! method, so the borrow checker treats them independently (the standard
//! way to interleave a read-only evaluation with a targeted mutation
//! without cloning the whole graph).

use super::super::application::analyzer::RangeAnalysisConfig;
use super::super::domain::constraint::{RangeLookup, ValueId};
use super::super::domain::graph::{ConstraintId, Graph, ValueType, VertexId};
use super::super::domain::jump_set::JumpSet;
use super::super::domain::range::{Interval, Range, StringRange};
use super::super::domain::zahl::Z;
use crate::errors::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Run to completion with the default configuration (spec §6 `Graph.Solve()`).
pub fn solve(graph: &mut Graph) -> Result<()> {
    solve_with_config(graph, &RangeAnalysisConfig::default())
}

pub fn solve_with_config(graph: &mut Graph, config: &RangeAnalysisConfig) -> Result<()> {
    tracing::info!(
        values = graph.value_count(),
        constraints = graph.constraint_count(),
        edges = graph.edges().len(),
        "solving constraint graph"
    );

    seed_constants(graph);

    let vertices = all_vertices(graph);
    let sccs = super::scc::tarjan_scc(&vertices, graph.edges());
    tracing::debug!(scc_count = sccs.len(), "computed SCCs");
    graph.set_sccs(sccs);

    let mut resolution_passes = 0usize;
    for scc_id in 0..graph.sccs().len() {
        let members = graph.sccs()[scc_id].clone();
        tracing::trace!(scc_id, size = members.len(), "processing SCC");
        if members.len() == 1 {
            process_trivial(graph, members[0]);
        } else {
            process_nontrivial(graph, &members, config);
        }
        if config.max_future_resolution_passes == 0
            || resolution_passes < config.max_future_resolution_passes
        {
            propagate_via_control_edges_from(graph, &members);
            resolution_passes += 1;
        }
    }

    super::clamp::apply(graph, config);
    Ok(())
}

fn seed_constants(graph: &mut Graph) {
    let constants: Vec<(ValueId, Z)> = graph.constants_snapshot();
    for (value, z) in constants {
        graph.set_range(value, Range::Int(Interval::singleton(z)));
    }
}

fn all_vertices(graph: &Graph) -> Vec<VertexId> {
    let mut vs: Vec<VertexId> = (0..graph.constraint_count()).map(VertexId::Constraint).collect();
    vs.extend(graph.typed_value_ids().map(VertexId::Value));
    vs
}

struct FieldLookup<'a> {
    ranges: &'a FxHashMap<ValueId, Range>,
    constants: &'a FxHashMap<ValueId, Z>,
    value_types: &'a FxHashMap<ValueId, ValueType>,
}

impl RangeLookup for FieldLookup<'_> {
    fn range(&self, value: ValueId) -> Range {
        if let Some(r) = self.ranges.get(&value) {
            return r.clone();
        }
        if let Some(c) = self.constants.get(&value) {
            return Range::Int(Interval::singleton(c.clone()));
        }
        match self.value_types.get(&value) {
            Some(ValueType::StringLike) => Range::Str(StringRange::unknown()),
            _ => Range::unknown_int(),
        }
    }
}

/// Resolve the future at `cid` (no-op if it is not a future), returning
/// whether `try_resolve` reports a change. See the module doc for why the
/// simultaneous field borrows here are sound.
fn resolve_future_if_any(graph: &mut Graph, cid: ConstraintId) -> bool {
    let snap = FieldLookup {
        ranges: graph.ranges_field(),
        constants: graph.constants_field(),
        value_types: graph.value_types_field(),
    };
    match graph.constraint_mut(cid).constraint.as_future_mut() {
        Some(fut) => fut.try_resolve(&snap),
        None => false,
    }
}

fn eval_and_write(graph: &mut Graph, cid: ConstraintId) {
    let sink = graph.constraint(cid).sink;
    let new_range = {
        let snap = FieldLookup {
            ranges: graph.ranges_field(),
            constants: graph.constants_field(),
            value_types: graph.value_types_field(),
        };
        graph.constraint(cid).constraint.eval(&snap)
    };
    graph.set_range(sink, new_range);
}

/// §4.5 trivial (single-vertex) SCC handling.
fn process_trivial(graph: &mut Graph, v: VertexId) {
    match v {
        VertexId::Constraint(cid) => {
            resolve_future_if_any(graph, cid);
            eval_and_write(graph, cid);
        }
        VertexId::Value(value) => {
            if !is_known(graph, value) {
                if let Some(default) = type_wide_default(graph, value) {
                    graph.set_range(value, default);
                }
            }
        }
    }
}

fn is_known(graph: &Graph, value: ValueId) -> bool {
    graph.raw_range(value).map(Range::is_known).unwrap_or(false) || graph.is_constant(value)
}

fn type_wide_default(graph: &Graph, value: ValueId) -> Option<Range> {
    match graph.value_type(value)? {
        ValueType::Integer { .. } => Some(Range::Int(Interval::top())),
        ValueType::StringLike => Some(Range::Str(StringRange::non_negative())),
        ValueType::Other => None,
    }
}

/// §4.5 non-trivial SCC: widen to fixpoint, resolve futures crossing into
/// the SCC, then narrow to fixpoint.
fn process_nontrivial(graph: &mut Graph, members: &[VertexId], config: &RangeAnalysisConfig) {
    resolve_futures_in(graph, members);
    widen_to_fixpoint(graph, members, config.max_widen_iterations);
    propagate_via_control_edges_from(graph, members);
    narrow_to_fixpoint(graph, members);
}

fn resolve_futures_in(graph: &mut Graph, members: &[VertexId]) {
    for &v in members {
        if let VertexId::Constraint(cid) = v {
            if graph.constraint(cid).constraint.is_future() {
                resolve_future_if_any(graph, cid);
                eval_and_write(graph, cid);
            }
        }
    }
}

/// Constraints inside `members` that consume `v` as an ordinary operand and
/// whose sink is also inside `members` (the internal cycle edges §4.5's
/// widening/narrowing worklists iterate over).
fn uses_in_scc(graph: &Graph, members: &[VertexId]) -> FxHashMap<ValueId, Vec<ConstraintId>> {
    let member_set: FxHashSet<VertexId> = members.iter().copied().collect();
    let mut uses: FxHashMap<ValueId, Vec<ConstraintId>> = FxHashMap::default();
    for &v in members {
        if let VertexId::Constraint(cid) = v {
            let node = graph.constraint(cid);
            if !member_set.contains(&VertexId::Value(node.sink)) {
                continue;
            }
            for operand in node.constraint.operands() {
                uses.entry(operand).or_default().push(cid);
            }
        }
    }
    uses
}

fn eval_constraint(graph: &Graph, cid: ConstraintId) -> Interval {
    let snap = FieldLookup {
        ranges: graph.ranges_field(),
        constants: graph.constants_field(),
        value_types: graph.value_types_field(),
    };
    graph
        .constraint(cid)
        .constraint
        .eval(&snap)
        .into_interval()
        .unwrap_or(Interval::Unknown)
}

fn current_interval(graph: &Graph, value: ValueId) -> Interval {
    graph
        .raw_range(value)
        .cloned()
        .and_then(Range::into_interval)
        .unwrap_or(Interval::Unknown)
}

/// §4.5 step 1: the SCC's entry points, operand values read by a
/// constraint defined in the SCC that are *not themselves* members of it
/// (so, by SCC/topological order, already resolved by an earlier SCC), plus
/// any member already known (a future's sink, once eagerly resolved above).
/// These seed the widening worklist; propagation through `uses_in_scc` then
/// carries the wave inward through the cycle.
fn entries(graph: &Graph, members: &[VertexId]) -> Vec<ValueId> {
    let member_set: FxHashSet<VertexId> = members.iter().copied().collect();
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for &v in members {
        let VertexId::Constraint(cid) = v else { continue };
        let node = graph.constraint(cid);
        if !member_set.contains(&VertexId::Value(node.sink)) {
            continue;
        }
        for operand in node.constraint.operands() {
            if is_known(graph, operand) && seen.insert(operand) {
                out.push(operand);
            }
        }
    }
    out
}

fn widen_to_fixpoint(graph: &mut Graph, members: &[VertexId], max_iterations: usize) {
    let jump_set = graph.jump_set().clone();
    let uses = uses_in_scc(graph, members);
    let mut worklist: VecDeque<ValueId> = entries(graph, members).into_iter().collect();
    let mut steps = 0usize;

    'outer: while let Some(v) = worklist.pop_front() {
        let Some(consumers) = uses.get(&v) else { continue };
        for &cid in consumers {
            if max_iterations != 0 && steps >= max_iterations {
                tracing::debug!(max_iterations, "widen worklist hit its safety cap");
                break 'outer;
            }
            steps += 1;
            let sink = graph.constraint(cid).sink;
            let new_interval = eval_constraint(graph, cid);
            let old_interval = current_interval(graph, sink);
            let (widened, changed) = widen(&jump_set, &old_interval, &new_interval);
            if changed {
                graph.set_range(sink, Range::Int(widened));
                worklist.push_back(sink);
            }
        }
    }
    graph.add_widen_steps(steps);

    for &v in members {
        if let VertexId::Value(id) = v {
            if !is_known(graph, id) {
                if let Some(default) = type_wide_default(graph, id) {
                    graph.set_range(id, default);
                }
            }
        }
    }
}

fn narrow_to_fixpoint(graph: &mut Graph, members: &[VertexId]) {
    let uses = uses_in_scc(graph, members);
    let actives: Vec<ValueId> = members
        .iter()
        .filter_map(|v| match v {
            VertexId::Value(id) if !graph.is_constant(*id) => Some(*id),
            _ => None,
        })
        .collect();
    let mut worklist: VecDeque<ValueId> = actives.into_iter().collect();
    let mut steps = 0usize;
    while let Some(v) = worklist.pop_front() {
        let Some(consumers) = uses.get(&v) else { continue };
        for &cid in consumers {
            steps += 1;
            let sink = graph.constraint(cid).sink;
            let new_interval = eval_constraint(graph, cid);
            let old_interval = current_interval(graph, sink);
            let (narrowed, changed) = narrow(&old_interval, &new_interval);
            if changed {
                graph.set_range(sink, Range::Int(narrowed));
                worklist.push_back(sink);
            }
        }
    }
    graph.add_narrow_steps(steps);
}

/// §4.6, generalized: for every control edge leaving `members`, attempt to
/// resolve its target future and, if that changed anything, re-evaluate and
/// write the future's sink immediately. This is what lets a future whose
/// home SCC already ran get retried once the SCC holding its symbolic bound
/// finishes, regardless of which of the two comes first in SCC order
/// (spec §9 open question: cross-SCC future re-resolution).
fn propagate_via_control_edges_from(graph: &mut Graph, members: &[VertexId]) {
    let member_set: FxHashSet<VertexId> = members.iter().copied().collect();
    let targets: Vec<ConstraintId> = graph
        .edges()
        .iter()
        .filter(|e| e.control && member_set.contains(&e.from))
        .filter_map(|e| match e.to {
            VertexId::Constraint(cid) => Some(cid),
            _ => None,
        })
        .collect();
    for cid in targets {
        if resolve_future_if_any(graph, cid) {
            eval_and_write(graph, cid);
        }
    }
}

/// §4.5.1: widen `old` toward `new`, snapping any side that grew past the
/// jump-set's enclosing element (or to infinity, if none encloses it).
fn widen(jump_set: &JumpSet, old: &Interval, new: &Interval) -> (Interval, bool) {
    let Interval::Known { lo: nlo, hi: nhi } = new else {
        return (old.clone(), false);
    };
    let Interval::Known { lo: olo, hi: ohi } = old else {
        return (new.clone(), true);
    };
    let lo_out = nlo < olo;
    let hi_out = nhi > ohi;
    match (lo_out, hi_out) {
        (true, true) => {
            let lo = jump_set.next_below(nlo);
            let hi = jump_set.next_above(nhi);
            (Interval::Known { lo, hi }, true)
        }
        (true, false) => {
            let lo = jump_set.next_below(nlo);
            (Interval::Known { lo, hi: ohi.clone() }, true)
        }
        (false, true) => {
            let hi = jump_set.next_above(nhi);
            (Interval::Known { lo: olo.clone(), hi }, true)
        }
        (false, false) => (old.clone(), false),
    }
}

/// §4.5.2: narrow `old` toward the freshly evaluated `new`, tightening each
/// bound that `new` has more precisely (lower moves up toward `nlo` when
/// `nlo` is finite, upper moves down toward `nhi` when `nhi` is finite). This
/// is the standard Cousot-Cousot narrowing the §8 ground-truth scenarios
/// assume: after widening has already driven `old` to a post-fixpoint
/// superset of every reachable value, narrowing recovers precision rather
/// than losing it.
fn narrow(old: &Interval, new: &Interval) -> (Interval, bool) {
    let Interval::Known { lo: nlo, hi: nhi } = new else {
        return (old.clone(), false);
    };
    let Interval::Known { lo: olo, hi: ohi } = old else {
        return (new.clone(), true);
    };
    let lo = Z::max(olo.clone(), nlo.clone());
    let hi = Z::min(ohi.clone(), nhi.clone());
    let changed = &lo != olo || &hi != ohi;
    (Interval::Known { lo, hi }, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::vrp::infrastructure::build::build_graph;
    use crate::features::vrp::ports::ssa::{BinOpKind, Branch, Comparison, Function, Inst, Token, Ty};

    const I64: Ty = Ty::Int { signed: true, bits: 64 };

    #[test]
    fn widen_snaps_to_jump_set_on_both_sides() {
        let js = JumpSet::build([Z::from_i64(0), Z::from_i64(10)]);
        let old = Interval::new(Z::from_i64(2), Z::from_i64(3));
        let new = Interval::new(Z::from_i64(-1), Z::from_i64(15));
        let (widened, changed) = widen(&js, &old, &new);
        assert!(changed);
        assert_eq!(widened, Interval::new(Z::NegInf, Z::PosInf));
    }

    #[test]
    fn widen_from_unknown_adopts_new_directly() {
        let js = JumpSet::new();
        let (widened, changed) = widen(&js, &Interval::Unknown, &Interval::new(Z::from_i64(1), Z::from_i64(2)));
        assert!(changed);
        assert_eq!(widened, Interval::new(Z::from_i64(1), Z::from_i64(2)));
    }

    #[test]
    fn narrow_recovers_a_finite_bound_from_infinity() {
        let old = Interval::new(Z::from_i64(0), Z::PosInf);
        let new = Interval::new(Z::from_i64(0), Z::from_i64(5));
        let (narrowed, changed) = narrow(&old, &new);
        assert!(changed);
        assert_eq!(narrowed, Interval::new(Z::from_i64(0), Z::from_i64(5)));
    }

    #[test]
    fn narrow_leaves_matching_bounds_unchanged() {
        let old = Interval::new(Z::from_i64(0), Z::from_i64(5));
        let (narrowed, changed) = narrow(&old, &old.clone());
        assert!(!changed);
        assert_eq!(narrowed, old);
    }

    #[test]
    fn straight_line_scenario() {
        let mut f = Function::new();
        f.push(Inst::Const { dest: 1, bits: 64, signed: true, value: Z::from_i64(3) });
        f.push(Inst::Const { dest: 2, bits: 64, signed: true, value: Z::from_i64(5) });
        f.push(Inst::BinOp { dest: 3, dest_ty: I64, op: BinOpKind::Add, lhs: 1, rhs: 2 });
        let mut g = build_graph(&f);
        g.solve().unwrap();
        assert_eq!(g.range(3), Range::Int(Interval::new(Z::from_i64(8), Z::from_i64(8))));
    }

    #[test]
    fn unbounded_accumulator_clamps_to_top_for_signed() {
        // i = phi(0, i + 1), no refinement.
        let mut f = Function::new();
        f.push(Inst::Const { dest: 1, bits: 64, signed: true, value: Z::from_i64(0) });
        f.push(Inst::Const { dest: 2, bits: 64, signed: true, value: Z::from_i64(1) });
        f.push(Inst::Phi { dest: 3, dest_ty: I64, operands: vec![1, 4] });
        f.push(Inst::BinOp { dest: 4, dest_ty: I64, op: BinOpKind::Add, lhs: 3, rhs: 2 });
        let mut g = build_graph(&f);
        g.solve().unwrap();
        assert_eq!(g.range(3), Range::Int(Interval::top()));
    }

    #[test]
    fn loop_with_constant_bound_scenario() {
        // i = phi(0, i_body + 1); i_body = sigma(i, i < 10, true); i_exit = sigma(i, i < 10, false)
        let mut f = Function::new();
        f.push(Inst::Const { dest: 0, bits: 64, signed: true, value: Z::from_i64(0) });
        f.push(Inst::Const { dest: 10, bits: 64, signed: true, value: Z::from_i64(10) });
        f.push(Inst::Const { dest: 1, bits: 64, signed: true, value: Z::from_i64(1) });
        f.push(Inst::Phi { dest: 2, dest_ty: I64, operands: vec![0, 4] });
        f.push(Inst::Sigma {
            dest: 3,
            dest_ty: I64,
            input: 2,
            branch: Branch::True,
            comparison: Comparison { op: Token::Lt, lhs: 2, rhs: 10 },
        });
        f.push(Inst::BinOp { dest: 4, dest_ty: I64, op: BinOpKind::Add, lhs: 3, rhs: 1 });
        f.push(Inst::Sigma {
            dest: 5,
            dest_ty: I64,
            input: 2,
            branch: Branch::False,
            comparison: Comparison { op: Token::Lt, lhs: 2, rhs: 10 },
        });
        let mut g = build_graph(&f);
        g.solve().unwrap();
        assert_eq!(g.range(3), Range::Int(Interval::new(Z::from_i64(0), Z::from_i64(9))));
        assert_eq!(g.range(5), Range::Int(Interval::new(Z::from_i64(10), Z::from_i64(10))));
        assert_eq!(g.range(2), Range::Int(Interval::new(Z::from_i64(0), Z::from_i64(10))));
    }

    #[test]
    fn cross_scc_future_resolution_regression() {
        // `x` and the sigma's future constraint form a DFS branch Tarjan
        // reaches and completes quickly, while `n`'s chain (through `b`,
        // `c`, and the Add) is explored first but finishes later; after the
        // raw completion order is reversed (scc.rs), the future's trivial
        // SCC ends up processed *before* the SCC that computes `n`. Its
        // first resolution attempt must therefore fail (n is not known
        // yet); `propagate_via_control_edges_from`, called again once n's
        // SCC finishes, must retry it and overwrite the sink with the
        // now-resolved bound, exercising the open question §9 #2 flags as
        // previously unverified. If this ordering assumption ever breaks
        // (e.g. after a `build_graph` change), this test would start
        // passing for the wrong reason (no retry needed), not failing, so
        // the assertion below pins the exact resulting interval rather than
        // just `is_known()`.
        let mut f = Function::new();
        f.push(Inst::Const { dest: 10, bits: 64, signed: true, value: Z::from_i64(5) }); // b
        f.push(Inst::Const { dest: 11, bits: 64, signed: true, value: Z::from_i64(3) }); // c
        f.push(Inst::BinOp { dest: 2, dest_ty: I64, op: BinOpKind::Add, lhs: 10, rhs: 11 }); // n = b + c
        f.push(Inst::Opaque { dest: 1, ty: I64 }); // x, the sigma input
        f.push(Inst::Sigma {
            dest: 3,
            dest_ty: I64,
            input: 1,
            branch: Branch::True,
            comparison: Comparison { op: Token::Lt, lhs: 1, rhs: 2 }, // x < n
        });
        let mut g = build_graph(&f);
        g.solve().unwrap();
        // n resolves to [8, 8], so x_refined = top ∩ [-inf, 7] = [-inf, 7].
        assert_eq!(
            g.range(3),
            Range::Int(Interval::new(Z::NegInf, Z::from_i64(7))),
            "future must re-resolve once n's SCC, processed after the future's own, supplies its range"
        );
    }
}
