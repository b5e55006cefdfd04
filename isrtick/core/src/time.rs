//! Microsecond time types

use core::fmt;

/// Absolute value of the monotonic clock, in microseconds
///
/// The underlying counter wraps at `u32::MAX` (about 71.6 minutes), so
/// instants are only ordered relative to each other through signed
/// differences. Two instants compare correctly as long as they are less than
/// `Duration::MAX_PERIOD` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Instant(u32);

impl Instant {
    /// Clock value at start-up
    pub const ZERO: Self = Self(0);

    /// Create an instant from a raw microsecond count
    pub const fn from_micros(micros: u32) -> Self {
        Self(micros)
    }

    /// Get the raw microsecond count
    pub const fn micros(self) -> u32 {
        self.0
    }

    /// Instant `by` later, wrapping at the end of the counter range
    pub const fn wrapping_add(self, by: Duration) -> Self {
        Self(self.0.wrapping_add(by.as_micros()))
    }

    /// Time elapsed from `earlier` up to `self`, wraparound-safe
    pub const fn elapsed_since(self, earlier: Instant) -> Duration {
        Duration::from_micros(self.0.wrapping_sub(earlier.0))
    }

    /// Signed distance from `self` to `now`; non-negative once `self` is reached
    pub const fn lag(self, now: Instant) -> i32 {
        now.0.wrapping_sub(self.0) as i32
    }

    /// Check whether the clock has reached this instant
    ///
    /// Computed as `(now - self) as i32 >= 0`, so a single wraparound of the
    /// counter between the two values does not invert the answer.
    pub const fn is_reached(self, now: Instant) -> bool {
        self.lag(now) >= 0
    }

    /// Check if this instant is strictly after another one (handles wraparound)
    pub const fn is_after(self, other: Instant) -> bool {
        other.lag(self) > 0
    }

    /// Time left until this instant, zero if already reached
    pub const fn remaining(self, now: Instant) -> Duration {
        if self.is_reached(now) {
            Duration::ZERO
        } else {
            Duration::from_micros(self.0.wrapping_sub(now.0))
        }
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}us", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Instant {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "t+{}us", self.0);
    }
}

/// Span of time in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    micros: u32,
}

impl Duration {
    /// Zero duration
    pub const ZERO: Self = Self { micros: 0 };

    /// Maximum representable duration
    pub const MAX: Self = Self { micros: u32::MAX };

    /// Longest period whose due-times still compare correctly across a
    /// counter wraparound
    pub const MAX_PERIOD: Self = Self { micros: i32::MAX as u32 };

    /// Create duration from microseconds
    pub const fn from_micros(micros: u32) -> Self {
        Self { micros }
    }

    /// Create duration from milliseconds, saturating at `Duration::MAX`
    pub const fn from_millis(millis: u32) -> Self {
        Self { micros: millis.saturating_mul(1_000) }
    }

    /// Create duration from seconds, saturating at `Duration::MAX`
    pub const fn from_secs(secs: u32) -> Self {
        Self { micros: secs.saturating_mul(1_000_000) }
    }

    /// Get microsecond count
    pub const fn as_micros(&self) -> u32 {
        self.micros
    }

    /// Convert to whole milliseconds
    pub const fn as_millis(&self) -> u32 {
        self.micros / 1_000
    }

    /// Check if duration is zero
    pub const fn is_zero(&self) -> bool {
        self.micros == 0
    }

    /// Check if this duration is usable as a task period
    pub const fn is_valid_period(&self) -> bool {
        self.micros != 0 && self.micros <= Self::MAX_PERIOD.micros
    }

    /// Sum of two durations, `None` on overflow
    pub const fn checked_add(self, other: Duration) -> Option<Self> {
        match self.micros.checked_add(other.micros) {
            Some(micros) => Some(Self { micros }),
            None => None,
        }
    }

    /// Difference of two durations, zero if `other` is longer
    pub const fn saturating_sub(self, other: Duration) -> Self {
        Self { micros: self.micros.saturating_sub(other.micros) }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.micros)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Duration {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}us", self.micros);
    }
}

/// Macro to create compile-time durations
#[macro_export]
macro_rules! duration {
    ($value:literal us) => {
        $crate::Duration::from_micros($value)
    };
    ($value:literal ms) => {
        $crate::Duration::from_millis($value)
    };
    ($value:literal s) => {
        $crate::Duration::from_secs($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_comparison_survives_wraparound() {
        let due = Instant::from_micros(0xFFFF_FFF0);
        assert!(!due.is_reached(Instant::from_micros(0xFFFF_FFE0)));
        assert!(due.is_reached(Instant::from_micros(0xFFFF_FFF0)));
        assert!(due.is_reached(Instant::from_micros(0x0000_0010)));
    }

    #[test]
    fn remaining_saturates_when_overdue() {
        let due = Instant::from_micros(5_000);
        assert_eq!(due.remaining(Instant::from_micros(4_000)), Duration::from_micros(1_000));
        assert_eq!(due.remaining(Instant::from_micros(6_000)), Duration::ZERO);
    }

    #[test]
    fn duration_macro() {
        assert_eq!(duration!(250 us).as_micros(), 250);
        assert_eq!(duration!(3 ms).as_micros(), 3_000);
        assert_eq!(duration!(2 s).as_millis(), 2_000);
    }
}
