//! Constraint graph (spec §3, §5, §6)
//!
//! A bipartite graph of SSA values and constraints. Ordinary edges run
//! operand-SSA → constraint and constraint → its sink SSA; control edges run
//! from a symbolic-bound SSA value to the future constraint it gates, and do
//! not participate in SCC formation.
//!
//! The graph owns its vertices, edges, constraints and range map; SSA values
//! themselves are just `u32` identifiers borrowed conceptually from the
//! caller (spec §5: no lifetime escalation, no ownership cycles even though
//! the conceptual graph has them).

use super::constraint::{Constraint, RangeLookup, ValueId};
use super::jump_set::JumpSet;
use super::range::{Interval, Range, StringRange};
use super::zahl::Z;
use crate::errors::Result;
use rustc_hash::FxHashMap;

pub type ConstraintId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexId {
    Value(ValueId),
    Constraint(ConstraintId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    /// Control edges gate future-constraint resolution; they never
    /// contribute to SCC formation used for scheduling (spec §3 invariants).
    pub control: bool,
}

/// The underlying type of an SSA value, as far as this analysis needs to
/// know it (spec §1: "the core only needs (a) integer vs non-integer, (b)
/// signed/unsigned, (c) bit width").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer { signed: bool, bits: u32 },
    StringLike,
    /// Float, pointer, aggregate, ... (out of scope, spec §1 Non-goals).
    Other,
}

#[derive(Debug, Clone)]
pub struct ConstraintNode {
    pub sink: ValueId,
    pub constraint: Constraint,
    pub scc: Option<usize>,
}

/// The constraint graph and the fixpoint solver's working state.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub(crate) constraints: Vec<ConstraintNode>,
    pub(crate) value_types: FxHashMap<ValueId, ValueType>,
    pub(crate) defining_constraint: FxHashMap<ValueId, ConstraintId>,
    pub(crate) constants: FxHashMap<ValueId, Z>,
    pub(crate) ranges: FxHashMap<ValueId, Range>,
    pub(crate) edges: Vec<Edge>,
    /// SCCs in reverse topological order: `sccs[0]` is a source SCC.
    pub(crate) sccs: Vec<Vec<VertexId>>,
    pub(crate) vertex_scc: FxHashMap<VertexId, usize>,
    pub(crate) jump_set: JumpSet,
    pub(crate) widen_steps: usize,
    pub(crate) narrow_steps: usize,
}

/// Ambient observability, mirroring the teacher's `AndersenStats`/`SCCStats`
/// (spec.md does not name this; SPEC_FULL §3 adds it as a supplemented
/// feature, not a new analysis).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub scc_count: usize,
    pub widen_steps: usize,
    pub narrow_steps: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value_type(&mut self, value: ValueId, ty: ValueType) {
        self.value_types.insert(value, ty);
    }

    pub fn value_type(&self, value: ValueId) -> Option<ValueType> {
        self.value_types.get(&value).copied()
    }

    pub fn set_constant(&mut self, value: ValueId, v: Z) {
        self.ranges.insert(value, Range::Int(Interval::singleton(v.clone())));
        self.constants.insert(value, v);
    }

    pub fn is_constant(&self, value: ValueId) -> bool {
        self.constants.contains_key(&value)
    }

    /// Add a constraint. Panics in debug builds if `sink` already has a
    /// defining constraint: every SSA value has at most one (spec §3
    /// invariants; this mirrors SSA itself).
    pub fn add_constraint(&mut self, sink: ValueId, constraint: Constraint) -> ConstraintId {
        debug_assert!(
            !self.defining_constraint.contains_key(&sink),
            "SSA invariant violated: value {sink} already has a defining constraint"
        );
        let id = self.constraints.len();
        self.constraints.push(ConstraintNode {
            sink,
            constraint,
            scc: None,
        });
        self.defining_constraint.insert(sink, id);
        id
    }

    pub fn constraint(&self, id: ConstraintId) -> &ConstraintNode {
        &self.constraints[id]
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> &mut ConstraintNode {
        &mut self.constraints[id]
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of distinct typed SSA values registered in the graph (spec
    /// §3 "Vertex. Either an SSA value or a constraint").
    pub fn value_count(&self) -> usize {
        self.value_types.len()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            vertex_count: self.value_count() + self.constraint_count(),
            edge_count: self.edges.len(),
            scc_count: self.sccs.len(),
            widen_steps: self.widen_steps,
            narrow_steps: self.narrow_steps,
        }
    }

    pub fn defining_constraint_of(&self, value: ValueId) -> Option<ConstraintId> {
        self.defining_constraint.get(&value).copied()
    }

    pub fn jump_set(&self) -> &JumpSet {
        &self.jump_set
    }

    pub fn set_jump_set(&mut self, js: JumpSet) {
        self.jump_set = js;
    }

    /// Populate `edges` from every constraint's operands (ordinary) and
    /// control operands, plus the constraint → sink edge. Called once after
    /// all constraints have been added.
    pub fn build_edges(&mut self) {
        self.edges.clear();
        for (id, node) in self.constraints.iter().enumerate() {
            for operand in node.constraint.operands() {
                self.edges.push(Edge {
                    from: VertexId::Value(operand),
                    to: VertexId::Constraint(id),
                    control: false,
                });
            }
            for bound in node.constraint.control_operands() {
                self.edges.push(Edge {
                    from: VertexId::Value(bound),
                    to: VertexId::Constraint(id),
                    control: true,
                });
            }
            self.edges.push(Edge {
                from: VertexId::Constraint(id),
                to: VertexId::Value(node.sink),
                control: false,
            });
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn sccs(&self) -> &[Vec<VertexId>] {
        &self.sccs
    }

    pub fn scc_of(&self, v: VertexId) -> Option<usize> {
        self.vertex_scc.get(&v).copied()
    }

    pub(crate) fn set_sccs(&mut self, sccs: Vec<Vec<VertexId>>) {
        self.vertex_scc.clear();
        for (scc_id, members) in sccs.iter().enumerate() {
            for &v in members {
                self.vertex_scc.insert(v, scc_id);
                if let VertexId::Constraint(cid) = v {
                    self.constraints[cid].scc = Some(scc_id);
                }
            }
        }
        self.sccs = sccs;
    }

    pub(crate) fn set_range(&mut self, value: ValueId, range: Range) {
        self.ranges.insert(value, range);
    }

    pub(crate) fn raw_range(&self, value: ValueId) -> Option<&Range> {
        self.ranges.get(&value)
    }

    pub(crate) fn ranges_field(&self) -> &FxHashMap<ValueId, Range> {
        &self.ranges
    }

    pub(crate) fn constants_field(&self) -> &FxHashMap<ValueId, Z> {
        &self.constants
    }

    pub(crate) fn value_types_field(&self) -> &FxHashMap<ValueId, ValueType> {
        &self.value_types
    }

    pub(crate) fn constants_snapshot(&self) -> Vec<(ValueId, Z)> {
        self.constants.iter().map(|(v, z)| (*v, z.clone())).collect()
    }

    pub(crate) fn typed_value_ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.value_types.keys().copied()
    }

    pub(crate) fn add_widen_steps(&mut self, n: usize) {
        self.widen_steps += n;
    }

    pub(crate) fn add_narrow_steps(&mut self, n: usize) {
        self.narrow_steps += n;
    }

    /// All computed ranges (spec §6: `Graph.Ranges()`).
    pub fn ranges(&self) -> &FxHashMap<ValueId, Range> {
        &self.ranges
    }

    /// Lookup with the §6 fallback: unknown integer returns `⊥`; unknown
    /// string returns an empty `StringRange`; a constant SSA value always
    /// returns its singleton even if it was never entered into the map.
    pub fn range(&self, value: ValueId) -> Range {
        if let Some(r) = self.ranges.get(&value) {
            return r.clone();
        }
        if let Some(c) = self.constants.get(&value) {
            return Range::Int(Interval::singleton(c.clone()));
        }
        match self.value_type(value) {
            Some(ValueType::StringLike) => Range::Str(StringRange::unknown()),
            _ => Range::unknown_int(),
        }
    }

    /// Run the fixpoint solver to completion (spec §6 `Graph.Solve()`).
    pub fn solve(&mut self) -> Result<()> {
        crate::features::vrp::infrastructure::solver::solve(self)
    }

    /// DOT rendering (spec §6 `Graph.Graphviz()`).
    pub fn graphviz(&self) -> String {
        crate::features::vrp::infrastructure::dot::render(self)
    }
}

impl RangeLookup for Graph {
    fn range(&self, value: ValueId) -> Range {
        Graph::range(self, value)
    }
}
