//! Constraint variants (spec §3, §4.1)
//!
//! One node per SSA operation the core models. Each constraint has exactly
//! one sink SSA value (tracked by the graph, not here) and an ordered list
//! of operand SSA values it reads. `Eval` computes the constraint's current
//! contribution from the operands' current ranges.

use super::range::{Interval, Range, StringRange};
use super::zahl::Z;
use serde::{Deserialize, Serialize};

/// SSA value identifier.
pub type ValueId = u32;

/// Read-only access to the current range map, used by `Eval`.
pub trait RangeLookup {
    fn range(&self, value: ValueId) -> Range;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Interval,
    IntConversion,
    Add,
    Sub,
    Mul,
    Phi,
    Slice,
    Intersection,
    FutureIntersection,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Interval => "INTERVAL",
            ConstraintKind::IntConversion => "CONVERT",
            ConstraintKind::Add => "ADD",
            ConstraintKind::Sub => "SUB",
            ConstraintKind::Mul => "MUL",
            ConstraintKind::Phi => "PHI",
            ConstraintKind::Slice => "SLICE",
            ConstraintKind::Intersection => "INTERSECT",
            ConstraintKind::FutureIntersection => "FUTURE_INTERSECT",
        }
    }
}

/// A pending intersection whose bounds are themselves SSA values
/// (spec §3, §4.6). `materialized`/`resolved` are the cached result of the
/// last `try_resolve` call; `Eval` reads `materialized`, it never re-reads
/// the bound variables itself (that only happens through the control edges
/// the solver walks explicitly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FutureIntersection {
    pub operand: ValueId,
    pub lower: Option<ValueId>,
    pub lower_offset: Z,
    pub upper: Option<ValueId>,
    pub upper_offset: Z,
    pub materialized: Interval,
    pub resolved: bool,
}

impl FutureIntersection {
    pub fn new(
        operand: ValueId,
        lower: Option<ValueId>,
        lower_offset: Z,
        upper: Option<ValueId>,
        upper_offset: Z,
    ) -> Self {
        Self {
            operand,
            lower,
            lower_offset,
            upper,
            upper_offset,
            materialized: Interval::Unknown,
            resolved: false,
        }
    }

    /// The SSA values this future depends on through control edges.
    pub fn bound_operands(&self) -> Vec<ValueId> {
        self.lower.into_iter().chain(self.upper).collect()
    }

    /// Attempt to materialise `I` from the current ranges of `lower`/`upper`.
    /// Returns true if `resolved` or `materialized` changed.
    pub fn try_resolve(&mut self, lookup: &dyn RangeLookup) -> bool {
        let lo = Self::resolve_side(self.lower, &self.lower_offset, true, lookup);
        let hi = Self::resolve_side(self.upper, &self.upper_offset, false, lookup);
        match (lo, hi) {
            (Some(lo), Some(hi)) if lo <= hi => {
                let next = Interval::Known {
                    lo: lo.clone(),
                    hi: hi.clone(),
                };
                let changed = !self.resolved || self.materialized != next;
                self.materialized = next;
                self.resolved = true;
                changed
            }
            _ => {
                let changed = self.resolved;
                self.resolved = false;
                self.materialized = Interval::Unknown;
                changed
            }
        }
    }

    fn resolve_side(
        bound: Option<ValueId>,
        offset: &Z,
        is_lower: bool,
        lookup: &dyn RangeLookup,
    ) -> Option<Z> {
        match bound {
            // No symbolic bound on this side: the offset itself carries the
            // (typically infinite) sentinel value for this side.
            None => Some(offset.clone()),
            Some(v) => match lookup.range(v) {
                Range::Int(Interval::Known { lo, hi }) => {
                    let edge = if is_lower { lo } else { hi };
                    edge.checked_add(offset)
                }
                _ => None,
            },
        }
    }
}

/// One constraint node. The sink SSA value is tracked by the graph, not
/// stored redundantly here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Constant interval `I` (spec §3).
    Interval(Interval),
    /// Range of `X`, unclamped; width clamping happens in the §4.7 post-pass.
    IntConversion { operand: ValueId },
    Add { lhs: ValueId, rhs: ValueId },
    Sub { lhs: ValueId, rhs: ValueId },
    Mul { lhs: ValueId, rhs: ValueId },
    /// Union of operand ranges.
    Phi { operands: Vec<ValueId> },
    /// Length-bound interval for the result of slicing a string; we only
    /// know the result is non-negative (spec §4.1, scenario 6).
    Slice { source: ValueId },
    /// `range(X) ∩ I` where `I` is fixed at build time.
    Intersection { operand: ValueId, bound: Interval },
    FutureIntersection(FutureIntersection),
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Interval(_) => ConstraintKind::Interval,
            Constraint::IntConversion { .. } => ConstraintKind::IntConversion,
            Constraint::Add { .. } => ConstraintKind::Add,
            Constraint::Sub { .. } => ConstraintKind::Sub,
            Constraint::Mul { .. } => ConstraintKind::Mul,
            Constraint::Phi { .. } => ConstraintKind::Phi,
            Constraint::Slice { .. } => ConstraintKind::Slice,
            Constraint::Intersection { .. } => ConstraintKind::Intersection,
            Constraint::FutureIntersection(_) => ConstraintKind::FutureIntersection,
        }
    }

    /// Ordinary (data) operand edges: SSA values this constraint reads to
    /// compute its sink's range. For `FutureIntersection` this is only `X`;
    /// the symbolic bounds are reached through control edges instead.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Constraint::Interval(_) => vec![],
            Constraint::IntConversion { operand } => vec![*operand],
            Constraint::Add { lhs, rhs } | Constraint::Sub { lhs, rhs } | Constraint::Mul { lhs, rhs } => {
                vec![*lhs, *rhs]
            }
            Constraint::Phi { operands } => operands.clone(),
            Constraint::Slice { source } => vec![*source],
            Constraint::Intersection { operand, .. } => vec![*operand],
            Constraint::FutureIntersection(f) => vec![f.operand],
        }
    }

    /// Control-edge operands: symbolic bounds of a `FutureIntersection`.
    pub fn control_operands(&self) -> Vec<ValueId> {
        match self {
            Constraint::FutureIntersection(f) => f.bound_operands(),
            _ => vec![],
        }
    }

    pub fn is_future(&self) -> bool {
        matches!(self, Constraint::FutureIntersection(_))
    }

    pub fn as_future_mut(&mut self) -> Option<&mut FutureIntersection> {
        match self {
            Constraint::FutureIntersection(f) => Some(f),
            _ => None,
        }
    }

    /// Compute this constraint's current contribution from the operands'
    /// ranges (spec §3 table).
    pub fn eval(&self, lookup: &dyn RangeLookup) -> Range {
        match self {
            Constraint::Interval(i) => Range::Int(i.clone()),
            Constraint::IntConversion { operand } => lookup.range(*operand),
            Constraint::Add { lhs, rhs } => {
                Range::Int(as_interval(lookup.range(*lhs)).add(&as_interval(lookup.range(*rhs))))
            }
            Constraint::Sub { lhs, rhs } => {
                Range::Int(as_interval(lookup.range(*lhs)).sub(&as_interval(lookup.range(*rhs))))
            }
            Constraint::Mul { lhs, rhs } => {
                Range::Int(as_interval(lookup.range(*lhs)).mul(&as_interval(lookup.range(*rhs))))
            }
            Constraint::Phi { operands } => {
                let joined = operands
                    .iter()
                    .map(|v| as_interval(lookup.range(*v)))
                    .fold(Interval::Unknown, |acc, next| acc.union(&next));
                Range::Int(joined)
            }
            Constraint::Slice { .. } => Range::Str(StringRange::non_negative()),
            Constraint::Intersection { operand, bound } => {
                Range::Int(as_interval(lookup.range(*operand)).intersect(bound))
            }
            Constraint::FutureIntersection(f) => {
                if f.resolved {
                    Range::Int(as_interval(lookup.range(f.operand)).intersect(&f.materialized))
                } else {
                    Range::Int(Interval::Unknown)
                }
            }
        }
    }
}

fn as_interval(r: Range) -> Interval {
    r.into_interval().unwrap_or(Interval::Unknown)
}
