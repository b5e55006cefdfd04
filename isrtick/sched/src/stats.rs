//! Runtime statistics

/// Scheduler counters for debugging and monitoring
///
/// All counters wrap on overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tick interrupts handled
    pub ticks: u32,
    /// Callbacks invoked
    pub dispatches: u32,
    /// Periods dropped by the catch-up policy
    pub skipped_periods: u32,
    /// Callbacks that ran longer than the configured budget
    pub overruns: u32,
}

impl SchedulerStats {
    /// All counters at zero
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            dispatches: 0,
            skipped_periods: 0,
            overruns: 0,
        }
    }

    /// Record one tick
    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Record one dispatch and the periods its reschedule dropped
    pub fn on_dispatch(&mut self, skipped: u32, overrun: bool) {
        self.dispatches = self.dispatches.wrapping_add(1);
        self.skipped_periods = self.skipped_periods.wrapping_add(skipped);
        if overrun {
            self.overruns = self.overruns.wrapping_add(1);
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SchedulerStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "SchedulerStats{{ ticks: {}, dispatches: {}, skipped: {}, overruns: {} }}",
            self.ticks,
            self.dispatches,
            self.skipped_periods,
            self.overruns
        );
    }
}
