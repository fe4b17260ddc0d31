//! Graphviz rendering (spec §6 `Graph.Graphviz()`)
//!
//! Plain `String` building via `std::fmt::Write`, in the style of
//! `cfg_printer::CFGPrinter`, no dedicated DOT-building crate, since the
//! teacher doesn't reach for one anywhere in the pack for a surface this
//! narrow. SSA values render as ovals, constraints as boxes; each vertex is
//! filled with its SCC's color from an 11-slot palette, cycling by
//! `scc_id % 11`; control edges render dashed.

use super::super::domain::graph::{Graph, VertexId};
use std::fmt::Write;

/// 11-slot palette (spec §6), chosen for adjacent-hue separability at small
/// SCC counts; repeats once the function has more SCCs than colors.
const PALETTE: [&str; 11] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5",
];

fn scc_color(scc_id: Option<usize>) -> &'static str {
    match scc_id {
        Some(id) => PALETTE[id % PALETTE.len()],
        None => "#ffffff",
    }
}

/// Renders `graph` as a DOT digraph. Infallible: `String`'s `Write` impl
/// never returns `Err`, so the `unwrap()`s below only ever fire on the
/// write-to-full-memory case every other teacher `Display for ... { fmt }`
/// body leaves unhandled too.
pub fn render(graph: &Graph) -> String {
    let mut out = String::new();
    writeln!(out, "digraph vrp {{").unwrap();
    writeln!(out, "    rankdir=TB;").unwrap();

    for value in graph.typed_value_ids() {
        let scc = graph.scc_of(VertexId::Value(value));
        writeln!(
            out,
            "    v{value} [shape=oval, style=filled, fillcolor=\"{}\", label=\"{value}\\n{}\"];",
            scc_color(scc),
            graph.range(value),
        )
        .unwrap();
    }

    for cid in 0..graph.constraint_count() {
        let node = graph.constraint(cid);
        let scc = graph.scc_of(VertexId::Constraint(cid));
        writeln!(
            out,
            "    c{cid} [shape=box, style=filled, fillcolor=\"{}\", label=\"{}\"];",
            scc_color(scc),
            node.constraint.kind().as_str(),
        )
        .unwrap();
    }

    for edge in graph.edges() {
        let (from, to) = (vertex_name(edge.from), vertex_name(edge.to));
        if edge.control {
            writeln!(out, "    {from} -> {to} [style=dashed];").unwrap();
        } else {
            writeln!(out, "    {from} -> {to};").unwrap();
        }
    }

    writeln!(out, "}}").unwrap();
    out
}

fn vertex_name(v: VertexId) -> String {
    match v {
        VertexId::Value(id) => format!("v{id}"),
        VertexId::Constraint(id) => format!("c{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::vrp::infrastructure::build::build_graph;
    use crate::features::vrp::ports::ssa::{BinOpKind, Function, Inst, Ty};

    const I32: Ty = Ty::Int { signed: true, bits: 32 };

    #[test]
    fn renders_a_well_formed_digraph() {
        let mut f = Function::new();
        f.push(Inst::Const { dest: 1, bits: 32, signed: true, value: crate::features::vrp::domain::zahl::Z::from_i64(2) });
        f.push(Inst::Opaque { dest: 2, ty: I32 });
        f.push(Inst::BinOp { dest: 3, dest_ty: I32, op: BinOpKind::Add, lhs: 1, rhs: 2 });
        let mut g = build_graph(&f);
        g.solve().unwrap();
        let dot = g.graphviz();
        assert!(dot.starts_with("digraph vrp {"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(dot.contains("shape=oval"));
        assert!(dot.contains("shape=box"));
    }

    #[test]
    fn control_edges_render_dashed() {
        use crate::features::vrp::ports::ssa::{Branch, Comparison, Token};
        let mut f = Function::new();
        f.push(Inst::Opaque { dest: 1, ty: I32 });
        f.push(Inst::Opaque { dest: 2, ty: I32 });
        f.push(Inst::Sigma {
            dest: 3,
            dest_ty: I32,
            input: 1,
            branch: Branch::True,
            comparison: Comparison { op: Token::Lt, lhs: 1, rhs: 2 },
        });
        let mut g = build_graph(&f);
        g.solve().unwrap();
        let dot = g.graphviz();
        assert!(dot.contains("style=dashed"));
    }
}
