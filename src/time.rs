//! Calendar timestamps with unbounded years.
//!
//! A [`Timestamp`] is a calendar date, a nanosecond-resolution time of
//! day, and a UTC offset in minutes. The year is a [`BigInt`], so the
//! range is unbounded in both directions; everything else fits the packed
//! 64-bit field the codec writes.
//!
//! Durations need no type of their own: a Dia duration is a signed 64-bit
//! nanosecond count, carried as a plain `i64`.

use num_bigint::BigInt;
use num_traits::Zero;

/// Nanoseconds in a civil day.
pub const NANOS_PER_DAY: u64 = 86_400_000_000_000;

/// Largest timezone offset magnitude, in minutes, that the wire format can
/// carry (10 bits).
pub const MAX_OFFSET_MINUTES: i16 = 1023;

/// A calendar date, time of day, and UTC offset.
///
/// # Example
///
/// ```
/// use bion::prelude::*;
///
/// // 2024-03-09T12:00:00 at UTC-05:00
/// let t = Timestamp::new(
///     BigInt::from(2024),
///     3,
///     9,
///     12 * 3_600_000_000_000,
///     -300,
/// );
///
/// assert_eq!(t.month(), 3);
/// assert_eq!(t.offset_minutes(), -300);
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
pub struct Timestamp {
    year: BigInt,
    month: u8,
    day: u8,
    nanos: u64,
    offset_minutes: i16,
}

impl Timestamp {
    /// Creates a timestamp.
    ///
    /// # Panics
    ///
    /// Panics if `month` is not in `1..=12`, `day` is not in `1..=31`,
    /// `nanos` is not below [`NANOS_PER_DAY`], or the offset magnitude
    /// exceeds [`MAX_OFFSET_MINUTES`].
    pub fn new(year: BigInt, month: u8, day: u8, nanos: u64, offset_minutes: i16) -> Timestamp {
        if month < 1 || month > 12 {
            panic!("month {} out of range", month)
        }
        if day < 1 || day > 31 {
            panic!("day {} out of range", day)
        }
        if nanos >= NANOS_PER_DAY {
            panic!("time of day {}ns out of range", nanos)
        }
        if offset_minutes.abs() > MAX_OFFSET_MINUTES {
            panic!("utc offset {}min out of range", offset_minutes)
        }

        Timestamp {
            year,
            month,
            day,
            nanos,
            offset_minutes,
        }
    }

    /// The minimum timestamp: year 0, January 1st, midnight, UTC. This is
    /// the value the codec encodes with an empty payload.
    pub fn min() -> Timestamp {
        Timestamp {
            year: BigInt::zero(),
            month: 1,
            day: 1,
            nanos: 0,
            offset_minutes: 0,
        }
    }

    /// Indicates whether this is [`Timestamp::min`].
    pub fn is_min(&self) -> bool {
        self.year.is_zero()
            && self.month == 1
            && self.day == 1
            && self.nanos == 0
            && self.offset_minutes == 0
    }

    /// The calendar year. Unbounded; negative years are before year 0.
    pub fn year(&self) -> &BigInt { &self.year }

    /// The calendar month, `1..=12`.
    pub fn month(&self) -> u8 { self.month }

    /// The day of month, `1..=31`.
    pub fn day(&self) -> u8 { self.day }

    /// Nanoseconds since local midnight.
    pub fn nanos(&self) -> u64 { self.nanos }

    /// Offset from UTC in minutes, negative west of Greenwich.
    pub fn offset_minutes(&self) -> i16 { self.offset_minutes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_round_numbers() {
        let t = Timestamp::min();
        assert!(t.is_min());
        assert_eq!(t.month(), 1);
        assert_eq!(t.day(), 1);
    }

    #[test]
    fn nonmin_detected() {
        let t = Timestamp::new(BigInt::zero(), 1, 1, 1, 0);
        assert!(!t.is_min());

        let t = Timestamp::new(BigInt::from(-44), 3, 15, 0, 0);
        assert!(!t.is_min());
    }

    #[test]
    #[should_panic]
    fn bad_month_panics() { Timestamp::new(BigInt::zero(), 13, 1, 0, 0); }

    #[test]
    #[should_panic]
    fn bad_nanos_panics() { Timestamp::new(BigInt::zero(), 1, 1, NANOS_PER_DAY, 0); }
}
