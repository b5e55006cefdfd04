//! Monotonic microsecond clock driven by the tick interrupt

use core::cell::Cell;
use critical_section::{CriticalSection, Mutex};

use crate::{Duration, Instant};

/// Monotonic clock assembled from fixed-size hardware ticks
///
/// Only the tick path advances the clock; everything else reads it. The
/// counter is wider than the native word on 8-bit targets, so every access
/// happens inside a critical section to avoid torn reads.
pub struct Clock {
    micros: Mutex<Cell<u32>>,
}

impl Clock {
    /// Create a clock reading zero
    pub const fn new() -> Self {
        Self::starting_at(Instant::ZERO)
    }

    /// Create a clock reading `start`
    pub const fn starting_at(start: Instant) -> Self {
        Self {
            micros: Mutex::new(Cell::new(start.micros())),
        }
    }

    /// Current clock value
    pub fn now(&self) -> Instant {
        critical_section::with(|cs| self.now_in(cs))
    }

    /// Current clock value, for callers already holding a critical section
    #[inline]
    pub fn now_in(&self, cs: CriticalSection<'_>) -> Instant {
        Instant::from_micros(self.micros.borrow(cs).get())
    }

    /// Advance the clock by one tick quantum and return the new value
    pub fn advance(&self, by: Duration) -> Instant {
        critical_section::with(|cs| self.advance_in(cs, by))
    }

    /// Advance the clock while already inside a critical section
    #[inline]
    pub fn advance_in(&self, cs: CriticalSection<'_>, by: Duration) -> Instant {
        let cell = self.micros.borrow(cs);
        let next = Instant::from_micros(cell.get()).wrapping_add(by);
        cell.set(next.micros());
        next
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
