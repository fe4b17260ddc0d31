//! Interval / StringRange lattice
//!
//! `Interval` is the abstract value for integer-typed SSA values: a closed
//! interval over `Z`, plus a distinguished unknown value `⊥` (spec §3).
//! `StringRange` wraps one `Interval` representing possible string lengths.
//! `Range` is the sum type returned by the public API, matching whichever
//! of the two the sink's underlying type calls for.

use super::zahl::Z;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed interval over `Z`, or the unknown/uninitialised value `⊥`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval {
    /// `⊥`, the empty/uninitialised interval.
    Unknown,
    Known { lo: Z, hi: Z },
}

impl Interval {
    pub fn unknown() -> Self {
        Interval::Unknown
    }

    /// A singleton `[v, v]`.
    pub fn singleton(v: Z) -> Self {
        Interval::Known {
            lo: v.clone(),
            hi: v,
        }
    }

    pub fn new(lo: Z, hi: Z) -> Self {
        debug_assert!(lo <= hi, "Interval invariant violated: lo > hi");
        Interval::Known { lo, hi }
    }

    /// `[-∞, +∞]`, the type-wide default for an integer with no other
    /// information (spec §4.5 step 2, §4.7).
    pub fn top() -> Self {
        Interval::Known {
            lo: Z::NegInf,
            hi: Z::PosInf,
        }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        matches!(self, Interval::Known { .. })
    }

    pub fn lo(&self) -> Option<&Z> {
        match self {
            Interval::Known { lo, .. } => Some(lo),
            Interval::Unknown => None,
        }
    }

    pub fn hi(&self) -> Option<&Z> {
        match self {
            Interval::Known { hi, .. } => Some(hi),
            Interval::Unknown => None,
        }
    }

    /// Union (join), treating `⊥` as the identity element.
    pub fn union(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Unknown, x) | (x, Interval::Unknown) => x.clone(),
            (Interval::Known { lo: l1, hi: h1 }, Interval::Known { lo: l2, hi: h2 }) => {
                Interval::Known {
                    lo: Z::min(l1.clone(), l2.clone()),
                    hi: Z::max(h1.clone(), h2.clone()),
                }
            }
        }
    }

    /// Intersection. An empty result (lo > hi) collapses to `⊥`.
    pub fn intersect(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Unknown, _) | (_, Interval::Unknown) => Interval::Unknown,
            (Interval::Known { lo: l1, hi: h1 }, Interval::Known { lo: l2, hi: h2 }) => {
                let lo = Z::max(l1.clone(), l2.clone());
                let hi = Z::min(h1.clone(), h2.clone());
                if lo <= hi {
                    Interval::Known { lo, hi }
                } else {
                    Interval::Unknown
                }
            }
        }
    }

    /// Interval addition. Either operand unknown makes the result unknown;
    /// an internal opposite-infinity addition (see `Z::checked_add`) also
    /// degrades to unknown rather than panicking (spec §9, DESIGN.md §4.3).
    pub fn add(&self, other: &Interval) -> Interval {
        self.binop(other, Z::checked_add, Z::checked_add)
    }

    /// Interval subtraction: `[l1, h1] - [l2, h2] = [l1 - h2, h1 - l2]`.
    pub fn sub(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Unknown, _) | (_, Interval::Unknown) => Interval::Unknown,
            (Interval::Known { lo: l1, hi: h1 }, Interval::Known { lo: l2, hi: h2 }) => {
                match (l1.checked_sub(h2), h1.checked_sub(l2)) {
                    (Some(lo), Some(hi)) if lo <= hi => Interval::Known { lo, hi },
                    _ => Interval::Unknown,
                }
            }
        }
    }

    pub fn mul(&self, other: &Interval) -> Interval {
        match (self, other) {
            (Interval::Unknown, _) | (_, Interval::Unknown) => Interval::Unknown,
            (Interval::Known { lo: l1, hi: h1 }, Interval::Known { lo: l2, hi: h2 }) => {
                let candidates = [
                    l1.mul(l2),
                    l1.mul(h2),
                    h1.mul(l2),
                    h1.mul(h2),
                ];
                let lo = candidates.iter().cloned().min().unwrap();
                let hi = candidates.into_iter().max().unwrap();
                Interval::Known { lo, hi }
            }
        }
    }

    /// Shared implementation for `add`/`sub`: apply `lo_op`/`hi_op` to the
    /// respective bounds, unknown if either operand is unknown or either
    /// application is undefined.
    fn binop(
        &self,
        other: &Interval,
        lo_op: impl Fn(&Z, &Z) -> Option<Z>,
        hi_op: impl Fn(&Z, &Z) -> Option<Z>,
    ) -> Interval {
        match (self, other) {
            (Interval::Unknown, _) | (_, Interval::Unknown) => Interval::Unknown,
            (Interval::Known { lo: l1, hi: h1 }, Interval::Known { lo: l2, hi: h2 }) => {
                match (lo_op(l1, l2), hi_op(h1, h2)) {
                    (Some(lo), Some(hi)) if lo <= hi => Interval::Known { lo, hi },
                    _ => Interval::Unknown,
                }
            }
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Unknown => write!(f, "⊥"),
            Interval::Known { lo, hi } => write!(f, "[{lo}, {hi}]"),
        }
    }
}

/// Possible lengths of a string-typed SSA value. Always `lo ≥ 0` when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRange(pub Interval);

impl StringRange {
    pub fn unknown() -> Self {
        StringRange(Interval::Unknown)
    }

    /// Non-negative length bound, e.g. the result of a `Slice` operation
    /// (spec §4.1, scenario 6): we only know the result cannot be negative.
    pub fn non_negative() -> Self {
        StringRange(Interval::new(Z::zero(), Z::PosInf))
    }

    pub fn from_interval(interval: Interval) -> Self {
        match &interval {
            Interval::Known { lo, .. } if *lo < Z::zero() => {
                StringRange(Interval::new(Z::zero(), interval.hi().unwrap().clone()))
            }
            _ => StringRange(interval),
        }
    }
}

// `Interval`'s Serialize/Deserialize are written by hand below because `Z`
// wraps a `BigInt`, which does not derive them; StringRange needs them to
// match the teacher's practice of deriving serde everywhere in the domain
// layer, so we give Interval a lightweight string-based representation.
impl Serialize for Interval {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Interval::Unknown => serializer.serialize_none(),
            Interval::Known { lo, hi } => {
                use serde::ser::SerializeTuple;
                let mut tup = serializer.serialize_tuple(2)?;
                tup.serialize_element(&lo.to_string())?;
                tup.serialize_element(&hi.to_string())?;
                tup.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Option<(String, String)> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => Interval::Unknown,
            Some((lo, hi)) => Interval::Known {
                lo: parse_z(&lo),
                hi: parse_z(&hi),
            },
        })
    }
}

fn parse_z(s: &str) -> Z {
    match s {
        "-inf" => Z::NegInf,
        "+inf" => Z::PosInf,
        finite => Z::Finite(finite.parse().unwrap_or_default()),
    }
}

/// The analysis result for one SSA value: either an integer interval or a
/// string length range, depending on the value's underlying type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Range {
    Int(Interval),
    Str(StringRange),
}

impl Range {
    pub fn unknown_int() -> Self {
        Range::Int(Interval::Unknown)
    }

    pub fn unknown_str() -> Self {
        Range::Str(StringRange::unknown())
    }

    pub fn is_known(&self) -> bool {
        match self {
            Range::Int(i) => i.is_known(),
            Range::Str(s) => s.0.is_known(),
        }
    }

    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Range::Int(i) => Some(i),
            Range::Str(_) => None,
        }
    }

    pub fn into_interval(self) -> Option<Interval> {
        match self {
            Range::Int(i) => Some(i),
            Range::Str(_) => None,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range::Int(i) => write!(f, "{i}"),
            Range::Str(s) => write!(f, "len{}", s.0),
        }
    }
}
