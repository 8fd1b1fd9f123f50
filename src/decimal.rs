//! Arbitrary-precision decimals.
//!
//! A [`Decimal`] is a [`BigInt`] significand scaled by a signed power of
//! ten: `significand * 10^scale`. Both parts are unbounded in magnitude on
//! the wire; the scale is kept as an `i64` here, which covers any exponent
//! a realistic document can carry.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

/// An exact decimal number: `significand * 10^scale`.
///
/// # Example
///
/// ```
/// use bion::prelude::*;
///
/// // 2.5 == 25 * 10^-1
/// let d = Decimal::new(BigInt::from(25), -1);
///
/// assert_eq!(d.significand(), &BigInt::from(25));
/// assert_eq!(d.scale(), -1);
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
pub struct Decimal {
    significand: BigInt,
    scale: i64,
}

impl Decimal {
    /// Creates a decimal from a significand and a base-ten exponent.
    ///
    /// A zero significand is canonicalized to scale 0 so that all
    /// representations of zero compare (and encode) identically.
    pub fn new<I: Into<BigInt>>(significand: I, scale: i64) -> Decimal {
        let significand = significand.into();
        let scale = if significand.is_zero() { 0 } else { scale };
        Decimal { significand, scale }
    }

    /// The integer significand.
    pub fn significand(&self) -> &BigInt { &self.significand }

    /// The base-ten exponent.
    pub fn scale(&self) -> i64 { self.scale }

    /// Indicates whether the decimal is exactly zero.
    pub fn is_zero(&self) -> bool { self.significand.is_zero() }

    /// Indicates whether the significand is negative.
    pub fn is_negative(&self) -> bool { self.significand.is_negative() }

    /// Consumes the decimal, returning `(significand, scale)`.
    pub fn into_parts(self) -> (BigInt, i64) { (self.significand, self.scale) }
}

impl From<BigInt> for Decimal {
    fn from(i: BigInt) -> Decimal { Decimal::new(i, 0) }
}

impl From<i64> for Decimal {
    fn from(i: i64) -> Decimal { Decimal::new(BigInt::from(i), 0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_canonical() {
        let a = Decimal::new(BigInt::zero(), 12);
        let b = Decimal::new(BigInt::zero(), -3);

        assert!(a.is_zero());
        assert_eq!(a, b);
        assert_eq!(a.scale(), 0);
    }

    #[test]
    fn signs() {
        assert!(Decimal::new(BigInt::from(-4), 2).is_negative());
        assert!(!Decimal::new(BigInt::from(4), -2).is_negative());
    }
}
