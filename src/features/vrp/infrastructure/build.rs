//! Constraint generation from SSA (spec §4.1)
//!
//! Walks a `ports::ssa::Function` and emits one constraint per modeled
//! instruction, plus the jump-set (§4.3) and constant seeding (§4.4). Two
//! passes: the first records every constant's literal value and every
//! value's declared type so σ-node handling can tell a symbolic bound from
//! a literal one regardless of instruction order; the second emits
//! constraints.

use crate::features::vrp::domain::constraint::{Constraint, FutureIntersection, ValueId};
use crate::features::vrp::domain::graph::{Graph, ValueType};
use crate::features::vrp::domain::jump_set::JumpSet;
use crate::features::vrp::domain::range::Interval;
use crate::features::vrp::domain::zahl::Z;
use crate::features::vrp::ports::ssa::{Branch, Comparison, Function, Inst, Token, Ty};
use rustc_hash::FxHashMap;

/// Builds a constraint graph from `function` (spec §6 `BuildGraph`).
pub fn build_graph(function: &Function) -> Graph {
    let mut graph = Graph::new();
    let literals = collect_literals(function);

    graph.set_jump_set(JumpSet::build(literals.values().cloned()));

    for inst in &function.instructions {
        emit(&mut graph, inst, &literals);
    }

    graph.build_edges();
    graph
}

fn collect_literals(function: &Function) -> FxHashMap<ValueId, Z> {
    function
        .instructions
        .iter()
        .filter_map(|inst| match inst {
            Inst::Const { dest, value, .. } => Some((*dest, value.clone())),
            _ => None,
        })
        .collect()
}

fn value_type(ty: Ty) -> Option<ValueType> {
    match ty {
        Ty::Int { signed, bits } => Some(ValueType::Integer { signed, bits }),
        Ty::StringLike => Some(ValueType::StringLike),
        Ty::Other => None,
    }
}

fn emit(graph: &mut Graph, inst: &Inst, literals: &FxHashMap<ValueId, Z>) {
    match inst {
        Inst::Const { dest, bits, signed, value } => {
            graph.set_value_type(*dest, ValueType::Integer { signed: *signed, bits: *bits });
            graph.set_constant(*dest, value.clone());
            // A constant reachable only through a phi still needs a vertex
            // of its own in the solver's universe (spec §4.1).
            graph.add_constraint(*dest, Constraint::Interval(Interval::singleton(value.clone())));
        }
        Inst::Convert { dest, dest_ty, operand } => {
            let Some(vt) = value_type(*dest_ty) else { return };
            if !matches!(vt, ValueType::Integer { .. }) {
                return;
            }
            graph.set_value_type(*dest, vt);
            graph.add_constraint(*dest, Constraint::IntConversion { operand: *operand });
        }
        Inst::BinOp { dest, dest_ty, op, lhs, rhs } => {
            let Some(vt) = value_type(*dest_ty) else { return };
            if !matches!(vt, ValueType::Integer { .. }) {
                return;
            }
            graph.set_value_type(*dest, vt);
            // Division, remainder, and shifts are recognized but deferred
            // (spec §9): no constraint is emitted, so the value falls back
            // to the type-wide default at the clamp pass rather than
            // silently vanishing from the universe.
            if op.is_deferred() {
                return;
            }
            let c = match op {
                crate::features::vrp::ports::ssa::BinOpKind::Add => {
                    Constraint::Add { lhs: *lhs, rhs: *rhs }
                }
                crate::features::vrp::ports::ssa::BinOpKind::Sub => {
                    Constraint::Sub { lhs: *lhs, rhs: *rhs }
                }
                crate::features::vrp::ports::ssa::BinOpKind::Mul => {
                    Constraint::Mul { lhs: *lhs, rhs: *rhs }
                }
                _ => unreachable!("deferred ops return above"),
            };
            graph.add_constraint(*dest, c);
        }
        Inst::Phi { dest, dest_ty, operands } => {
            let Some(vt) = value_type(*dest_ty) else { return };
            if !matches!(vt, ValueType::Integer { .. }) {
                return;
            }
            graph.set_value_type(*dest, vt);
            graph.add_constraint(*dest, Constraint::Phi { operands: operands.clone() });
        }
        Inst::Slice { dest, source, source_ty } => {
            if !matches!(source_ty, Ty::StringLike) {
                return;
            }
            graph.set_value_type(*dest, ValueType::StringLike);
            graph.add_constraint(*dest, Constraint::Slice { source: *source });
        }
        Inst::Sigma { dest, dest_ty, input, branch, comparison } => {
            let Some(vt) = value_type(*dest_ty) else { return };
            if !matches!(vt, ValueType::Integer { .. }) {
                return;
            }
            graph.set_value_type(*dest, vt);
            if let Some(c) = sigma_constraint(*input, *branch, *comparison, literals) {
                graph.add_constraint(*dest, c);
            }
        }
        Inst::Opaque { dest, ty } => {
            if let Some(vt) = value_type(*ty) {
                graph.set_value_type(*dest, vt);
            }
        }
    }
}

/// Normalizes a σ-node's guarding comparison to "`input` `op` `other`" on
/// the taken branch: apply the false-branch inversion, then (if the
/// comparison names `input` on its right side) swap-and-invert again so
/// `other` is always the non-`input` side. Two independent inversions
/// compose correctly since `Token::invert` is an involution.
fn normalize(input: ValueId, branch: Branch, cmp: Comparison) -> Option<(Token, ValueId)> {
    let op = if branch == Branch::False { cmp.op.invert() } else { cmp.op };
    if cmp.lhs == input {
        Some((op, cmp.rhs))
    } else if cmp.rhs == input {
        Some((op.invert(), cmp.lhs))
    } else {
        // Precondition violation (spec §7.2): the predecessor's terminating
        // comparison does not mention this σ's input. Skip silently.
        None
    }
}

fn sigma_constraint(
    input: ValueId,
    branch: Branch,
    comparison: Comparison,
    literals: &FxHashMap<ValueId, Z>,
) -> Option<Constraint> {
    let (op, other) = normalize(input, branch, comparison)?;

    if let Some(literal) = literals.get(&other) {
        let (lo, hi) = concrete_bounds(op, literal)?;
        Some(Constraint::Intersection { operand: input, bound: Interval::new(lo, hi) })
    } else {
        let (lower, lower_offset, upper, upper_offset) = symbolic_bounds(op, other)?;
        Some(Constraint::FutureIntersection(FutureIntersection::new(
            input,
            lower,
            lower_offset,
            upper,
            upper_offset,
        )))
    }
}

fn concrete_bounds(op: Token, other: &Z) -> Option<(Z, Z)> {
    match op {
        Token::Eq => Some((other.clone(), other.clone())),
        Token::Gt => Some((other.checked_add(&Z::one())?, Z::PosInf)),
        Token::Ge => Some((other.clone(), Z::PosInf)),
        Token::Lt => Some((Z::NegInf, other.checked_add(&Z::from_i64(-1))?)),
        Token::Le => Some((Z::NegInf, other.clone())),
        Token::Ne => None,
    }
}

type SymbolicBounds = (Option<ValueId>, Z, Option<ValueId>, Z);

fn symbolic_bounds(op: Token, other: ValueId) -> Option<SymbolicBounds> {
    match op {
        Token::Eq => Some((Some(other), Z::zero(), Some(other), Z::zero())),
        Token::Gt => Some((Some(other), Z::one(), None, Z::PosInf)),
        Token::Ge => Some((Some(other), Z::zero(), None, Z::PosInf)),
        Token::Lt => Some((None, Z::NegInf, Some(other), Z::from_i64(-1))),
        Token::Le => Some((None, Z::NegInf, Some(other), Z::zero())),
        Token::Ne => None,
    }
}
