//! Type-width clamp (spec §4.7), run once after every SCC has been solved.
//!
//! A projection, not a refinement: it is safe to lose precision here because
//! downstream consumers cannot assume anything tighter than the value's
//! declared type. Idempotent by construction (spec §8 "type-clamp
//! idempotence"): every branch below either leaves the interval alone or
//! drives it to a fixed point (`[0, +∞]` for unsigned, `[-∞, +∞]` for
//! signed) that re-clamping cannot move further.

use super::super::application::analyzer::RangeAnalysisConfig;
use super::super::domain::graph::{Graph, ValueType};
use super::super::domain::range::{Interval, Range};
use super::super::domain::zahl::Z;
use num_bigint::BigInt;

/// Walk every typed value and clamp its final range to the sink's declared
/// integer type. Non-integer values (strings, `Other`) are left untouched.
/// A declared width of `0` bits means "native word size" (spec §9 open
/// question on the machine model); it resolves against
/// `config.word_size_bytes` rather than a hard-coded 8.
pub fn apply(graph: &mut Graph, config: &RangeAnalysisConfig) {
    let targets: Vec<_> = graph
        .value_types_field()
        .iter()
        .filter_map(|(&v, &ty)| match ty {
            ValueType::Integer { signed, bits } => Some((v, signed, bits)),
            _ => None,
        })
        .collect();

    for (value, signed, bits) in targets {
        let Some(Range::Int(interval)) = graph.raw_range(value).cloned() else {
            continue;
        };
        let Interval::Known { lo, hi } = &interval else {
            continue;
        };
        let bits = if bits == 0 { config.word_size_bytes * 8 } else { bits };
        let clamped = if signed {
            clamp_signed(lo, hi, bits)
        } else {
            clamp_unsigned(lo, hi)
        };
        graph.set_range(value, Range::Int(clamped));
    }
}

/// Unsigned: a negative lower bound is repaired to `0`; the upper bound is
/// intentionally left as-is even when it is wider than the native width,
/// since spec §4.7 does not ask for an unsigned upper clamp here.
fn clamp_unsigned(lo: &Z, hi: &Z) -> Interval {
    if matches!(lo, Z::Finite(v) if v.sign() == num_bigint::Sign::Minus) {
        Interval::Known { lo: Z::zero(), hi: Z::PosInf }
    } else {
        Interval::Known { lo: lo.clone(), hi: hi.clone() }
    }
}

/// Signed: widen to `[-∞, +∞]` the moment either bound falls outside the
/// `bits`-wide representable range, or the upper bound is already infinite.
fn clamp_signed(lo: &Z, hi: &Z, bits: u32) -> Interval {
    if hi.is_pos_inf() {
        return Interval::top();
    }
    let upper_limit = (BigInt::from(1) << (bits - 1)) - BigInt::from(1);
    let lower_limit = -(BigInt::from(1) << (bits - 1));
    if let Z::Finite(h) = hi {
        if *h > upper_limit {
            return Interval::top();
        }
    }
    if let Z::Finite(l) = lo {
        if *l < lower_limit {
            return Interval::top();
        }
    }
    Interval::Known { lo: lo.clone(), hi: hi.clone() }
}
