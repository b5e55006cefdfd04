//! Hardware tick source abstraction

use crate::Duration;

/// Periodic interrupt source that drives the scheduler clock
///
/// An implementation owns one timer peripheral. After `start` it must call
/// the scheduler's tick entry point once per `quantum`, from a context that
/// cannot be preempted by another tick.
pub trait TickSource {
    /// Clock advance per tick interrupt
    fn quantum(&self) -> Duration;

    /// Configure the peripheral and enable its periodic interrupt
    fn start(&mut self);

    /// Disable the periodic interrupt
    fn stop(&mut self) {}
}

/// Tick source driven by hand, for simulation and host tests
///
/// It never generates interrupts on its own; the owner calls the scheduler's
/// tick entry point directly. Start and stop requests are counted so callers
/// can observe the lazy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualTick {
    quantum: Duration,
    starts: u32,
    stops: u32,
}

impl ManualTick {
    /// Create a manual source advancing the clock by `quantum` per tick
    pub const fn new(quantum: Duration) -> Self {
        Self {
            quantum,
            starts: 0,
            stops: 0,
        }
    }

    /// Number of times the source was started
    pub const fn starts(&self) -> u32 {
        self.starts
    }

    /// Number of times the source was stopped
    pub const fn stops(&self) -> u32 {
        self.stops
    }
}

impl TickSource for ManualTick {
    fn quantum(&self) -> Duration {
        self.quantum
    }

    fn start(&mut self) {
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ManualTick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "ManualTick{{ quantum: {}, starts: {}, stops: {} }}",
            self.quantum,
            self.starts,
            self.stops
        );
    }
}
