//! Tarjan SCC detection over the constraint graph (spec §4.2)
//!
//! Adapted from the teacher's `points_to::infrastructure::scc_detector`:
//! same index/lowlink/on-stack DFS, generalized from `u32` variable ids to
//! `VertexId` (values and constraints share one vertex space here) and from
//! an edge-inferred node set to an explicit one (a value with no edges at
//! all must still get a trivial SCC of its own so the solver's "promote to
//! type-wide default" step, §4.5 step 4, reaches it).
//!
//! Tarjan's algorithm completes SCCs in reverse topological order relative
//! to edge direction (a sink's SCC finishes before its source's). Our edges
//! run operand → constraint → result, i.e. dependency order, so we reverse
//! the raw completion order before returning: index 0 becomes the source
//! SCC, matching spec §4.2's renumbering.

use super::super::domain::graph::{Edge, VertexId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::min;

/// Computes SCCs over `vertices` using only non-control `edges`, numbered so
/// that index 0 has no incoming dependency from another SCC.
pub fn tarjan_scc(vertices: &[VertexId], edges: &[Edge]) -> Vec<Vec<VertexId>> {
    let mut adj: FxHashMap<VertexId, Vec<VertexId>> = FxHashMap::default();
    for v in vertices {
        adj.entry(*v).or_default();
    }
    for edge in edges {
        if edge.control {
            continue;
        }
        adj.entry(edge.from).or_default().push(edge.to);
        adj.entry(edge.to).or_default();
    }

    let mut state = TarjanState::default();
    for &v in vertices {
        if !state.index.contains_key(&v) {
            tarjan_dfs(v, &adj, &mut state);
        }
    }

    state.sccs.reverse();
    state.sccs
}

#[derive(Default)]
struct TarjanState {
    index: FxHashMap<VertexId, usize>,
    lowlink: FxHashMap<VertexId, usize>,
    on_stack: FxHashSet<VertexId>,
    stack: Vec<VertexId>,
    current_index: usize,
    sccs: Vec<Vec<VertexId>>,
}

fn tarjan_dfs(v: VertexId, adj: &FxHashMap<VertexId, Vec<VertexId>>, state: &mut TarjanState) {
    state.index.insert(v, state.current_index);
    state.lowlink.insert(v, state.current_index);
    state.current_index += 1;
    state.stack.push(v);
    state.on_stack.insert(v);

    if let Some(neighbors) = adj.get(&v) {
        for &w in neighbors {
            if !state.index.contains_key(&w) {
                tarjan_dfs(w, adj, state);
                let new_lowlink = min(state.lowlink[&v], state.lowlink[&w]);
                state.lowlink.insert(v, new_lowlink);
            } else if state.on_stack.contains(&w) {
                let new_lowlink = min(state.lowlink[&v], state.index[&w]);
                state.lowlink.insert(v, new_lowlink);
            }
        }
    }

    if state.lowlink[&v] == state.index[&v] {
        let mut scc = Vec::new();
        loop {
            let w = state.stack.pop().expect("root vertex must still be on stack");
            state.on_stack.remove(&w);
            scc.push(w);
            if w == v {
                break;
            }
        }
        state.sccs.push(scc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::vrp::domain::constraint::ValueId;

    fn val(id: ValueId) -> VertexId {
        VertexId::Value(id)
    }

    fn edge(from: VertexId, to: VertexId) -> Edge {
        Edge { from, to, control: false }
    }

    #[test]
    fn chain_puts_source_first() {
        let a = val(1);
        let b = val(2);
        let c = val(3);
        let vertices = vec![a, b, c];
        let edges = vec![edge(a, b), edge(b, c)];
        let sccs = tarjan_scc(&vertices, &edges);
        assert_eq!(sccs, vec![vec![a], vec![b], vec![c]]);
    }

    #[test]
    fn cycle_collapses_into_one_scc() {
        let a = val(1);
        let b = val(2);
        let edges = vec![edge(a, b), edge(b, a)];
        let sccs = tarjan_scc(&[a, b], &edges);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 2);
    }

    #[test]
    fn isolated_vertex_gets_its_own_trivial_scc() {
        let a = val(1);
        let sccs = tarjan_scc(&[a], &[]);
        assert_eq!(sccs, vec![vec![a]]);
    }

    #[test]
    fn control_edges_do_not_merge_sccs() {
        let a = val(1);
        let b = val(2);
        let edges = vec![Edge { from: a, to: b, control: true }, Edge { from: b, to: a, control: true }];
        let sccs = tarjan_scc(&[a, b], &edges);
        assert_eq!(sccs.len(), 2);
    }
}
