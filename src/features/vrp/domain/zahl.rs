//! Extended integer `Z`
//!
//! An arbitrary-precision integer (`num_bigint::BigInt`) augmented with two
//! idempotent infinities, `-∞` and `+∞`. `-∞ < z < +∞` for every finite `z`.
//!
//! Addition saturates: `+∞ + x = +∞`, `-∞ + x = -∞`. `+∞ + -∞` has no sound
//! meaning; per the resolution recorded in DESIGN.md it is never produced by
//! `Z::checked_add`: callers get `None` and fold that into an unknown
//! interval rather than the solver ever constructing or propagating it.

use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;

/// Arbitrary-precision integer extended with `-∞` and `+∞`.
#[derive(Debug, Clone, Eq)]
pub enum Z {
    NegInf,
    Finite(BigInt),
    PosInf,
}

impl Z {
    pub fn from_i64(v: i64) -> Self {
        Z::Finite(BigInt::from(v))
    }

    pub fn zero() -> Self {
        Z::Finite(BigInt::from(0))
    }

    pub fn one() -> Self {
        Z::Finite(BigInt::from(1))
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        matches!(self, Z::Finite(_))
    }

    #[inline]
    pub fn is_neg_inf(&self) -> bool {
        matches!(self, Z::NegInf)
    }

    #[inline]
    pub fn is_pos_inf(&self) -> bool {
        matches!(self, Z::PosInf)
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Z::Finite(v) => Some(v),
            _ => None,
        }
    }

    /// Saturating addition. Returns `None` only for the undefined
    /// `+∞ + -∞` (or `-∞ + +∞`) case; the solver treats that as "no sound
    /// value" and falls back to the unknown interval rather than ever
    /// storing or comparing against it.
    pub fn checked_add(&self, other: &Z) -> Option<Z> {
        match (self, other) {
            (Z::PosInf, Z::NegInf) | (Z::NegInf, Z::PosInf) => None,
            (Z::PosInf, _) | (_, Z::PosInf) => Some(Z::PosInf),
            (Z::NegInf, _) | (_, Z::NegInf) => Some(Z::NegInf),
            (Z::Finite(a), Z::Finite(b)) => Some(Z::Finite(a + b)),
        }
    }

    pub fn neg(&self) -> Z {
        match self {
            Z::NegInf => Z::PosInf,
            Z::PosInf => Z::NegInf,
            Z::Finite(v) => Z::Finite(-v),
        }
    }

    /// Saturating subtraction: `self - other`.
    pub fn checked_sub(&self, other: &Z) -> Option<Z> {
        self.checked_add(&other.neg())
    }

    /// Saturating multiplication. `0 * ±∞` is defined as `0` (standard
    /// interval-arithmetic convention); any other infinite operand saturates
    /// toward the sign of the product.
    pub fn mul(&self, other: &Z) -> Z {
        match (self, other) {
            (Z::Finite(a), Z::Finite(b)) => Z::Finite(a * b),
            (Z::Finite(a), inf) | (inf, Z::Finite(a)) if a.sign() == num_bigint::Sign::NoSign => {
                let _ = inf;
                Z::zero()
            }
            _ => {
                let neg = self.sign() * other.sign() < 0;
                if neg {
                    Z::NegInf
                } else {
                    Z::PosInf
                }
            }
        }
    }

    fn sign(&self) -> i32 {
        match self {
            Z::NegInf => -1,
            Z::PosInf => 1,
            Z::Finite(v) => match v.sign() {
                num_bigint::Sign::Minus => -1,
                num_bigint::Sign::NoSign => 0,
                num_bigint::Sign::Plus => 1,
            },
        }
    }

    pub fn min(a: Z, b: Z) -> Z {
        if a <= b {
            a
        } else {
            b
        }
    }

    pub fn max(a: Z, b: Z) -> Z {
        if a >= b {
            a
        } else {
            b
        }
    }
}

impl PartialEq for Z {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.cmp(other), Ordering::Equal)
    }
}

impl PartialOrd for Z {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Z {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Z::NegInf, Z::NegInf) => Ordering::Equal,
            (Z::PosInf, Z::PosInf) => Ordering::Equal,
            (Z::NegInf, _) => Ordering::Less,
            (_, Z::NegInf) => Ordering::Greater,
            (Z::PosInf, _) => Ordering::Greater,
            (_, Z::PosInf) => Ordering::Less,
            (Z::Finite(a), Z::Finite(b)) => a.cmp(b),
        }
    }
}

impl std::hash::Hash for Z {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Z::NegInf => 0u8.hash(state),
            Z::PosInf => 1u8.hash(state),
            Z::Finite(v) => {
                2u8.hash(state);
                v.hash(state);
            }
        }
    }
}

impl fmt::Display for Z {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Z::NegInf => write!(f, "-inf"),
            Z::PosInf => write!(f, "+inf"),
            Z::Finite(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Z {
    fn from(v: i64) -> Self {
        Z::from_i64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_treats_infinities_as_extremes() {
        assert!(Z::NegInf < Z::from_i64(-1_000_000));
        assert!(Z::PosInf > Z::from_i64(1_000_000));
        assert_eq!(Z::NegInf, Z::NegInf);
        assert_eq!(Z::PosInf, Z::PosInf);
    }

    #[test]
    fn addition_saturates() {
        assert_eq!(Z::PosInf.checked_add(&Z::from_i64(5)), Some(Z::PosInf));
        assert_eq!(Z::NegInf.checked_add(&Z::from_i64(5)), Some(Z::NegInf));
        assert_eq!(
            Z::from_i64(2).checked_add(&Z::from_i64(3)),
            Some(Z::from_i64(5))
        );
    }

    #[test]
    fn opposite_infinities_are_undefined() {
        assert_eq!(Z::PosInf.checked_add(&Z::NegInf), None);
        assert_eq!(Z::NegInf.checked_add(&Z::PosInf), None);
    }

    #[test]
    fn mul_saturates_by_sign() {
        assert_eq!(Z::from_i64(2).mul(&Z::PosInf), Z::PosInf);
        assert_eq!(Z::from_i64(-2).mul(&Z::PosInf), Z::NegInf);
        assert_eq!(Z::zero().mul(&Z::PosInf), Z::zero());
    }

    #[test]
    fn min_max_respect_ordering() {
        assert_eq!(Z::min(Z::from_i64(1), Z::from_i64(2)), Z::from_i64(1));
        assert_eq!(Z::max(Z::from_i64(1), Z::PosInf), Z::PosInf);
    }
}
