//! Nanosecond-precision instants
//!
//! A [`TimeValue`] is a pair of integer seconds and integer nanoseconds. The
//! nanosecond field is always kept in `[0, 1e9)`; the seconds field absorbs
//! every carry and borrow, so instants before the epoch have negative seconds
//! and a non-negative nanosecond part.

use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds per second
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// An instant (or a non-negative duration) with nanosecond precision.
///
/// Ordering is lexicographic: seconds first, then nanoseconds. Because the
/// nanosecond field is normalized this is the same as chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeValue {
    secs: i64,
    nanos: u32,
}

impl TimeValue {
    /// The zero instant (the Unix epoch) or the zero duration.
    pub const ZERO: Self = Self { secs: 0, nanos: 0 };

    /// Build a value from whole seconds and an arbitrary nanosecond count.
    ///
    /// The nanosecond count may be negative or exceed one second; it is
    /// folded into the seconds field.
    #[must_use]
    pub const fn normalize(secs: i64, nanos: i64) -> Self {
        let carry = nanos.div_euclid(NANOS_PER_SEC);
        let rem = nanos.rem_euclid(NANOS_PER_SEC);
        Self {
            secs: secs + carry,
            // rem is in [0, 1e9) so it always fits in a u32
            nanos: rem as u32,
        }
    }

    /// Build a value from whole seconds only.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }

    #[must_use]
    pub const fn secs(&self) -> i64 {
        self.secs
    }

    #[must_use]
    pub const fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Three-way comparison, seconds first then nanoseconds.
    #[must_use]
    pub fn compare(a: &Self, b: &Self) -> Ordering {
        a.secs.cmp(&b.secs).then(a.nanos.cmp(&b.nanos))
    }

    /// Magnitude of `a - b` and whether that difference is negative.
    ///
    /// The magnitude never carries a negative nanosecond field: on borrow the
    /// seconds are decremented and one second's worth of nanoseconds is added.
    /// Adding the magnitude back to the smaller operand reproduces the larger
    /// one exactly.
    #[must_use]
    pub fn difference(a: &Self, b: &Self) -> (Self, bool) {
        let (larger, smaller, negative) = match Self::compare(a, b) {
            Ordering::Less => (b, a, true),
            _ => (a, b, false),
        };
        let mut secs = larger.secs - smaller.secs;
        let mut nanos = i64::from(larger.nanos) - i64::from(smaller.nanos);
        if nanos < 0 {
            secs -= 1;
            nanos += NANOS_PER_SEC;
        }
        (Self::normalize(secs, nanos), negative)
    }

    /// Add a duration (or any other time value) with carry.
    ///
    /// Returns `None` if the seconds field would overflow.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let mut secs = self.secs.checked_add(other.secs)?;
        let mut nanos = i64::from(self.nanos) + i64::from(other.nanos);
        if nanos >= NANOS_PER_SEC {
            secs = secs.checked_add(1)?;
            nanos -= NANOS_PER_SEC;
        }
        Some(Self::normalize(secs, nanos))
    }

    /// Subtract a duration with borrow.
    ///
    /// Returns `None` if the seconds field would overflow.
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let mut secs = self.secs.checked_sub(other.secs)?;
        let mut nanos = i64::from(self.nanos) - i64::from(other.nanos);
        if nanos < 0 {
            secs = secs.checked_sub(1)?;
            nanos += NANOS_PER_SEC;
        }
        Some(Self::normalize(secs, nanos))
    }

    /// Shift by a signed number of nanoseconds.
    #[must_use]
    pub const fn offset_nanos(&self, delta: i64) -> Self {
        Self::normalize(self.secs, self.nanos as i64 + delta)
    }

    /// Convert from a [`SystemTime`], including times before the epoch.
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::normalize(d.as_secs() as i64, i64::from(d.subsec_nanos())),
            Err(e) => {
                let d = e.duration();
                Self::normalize(-(d.as_secs() as i64), -i64::from(d.subsec_nanos()))
            }
        }
    }

    /// Sample the system clock.
    #[must_use]
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}
