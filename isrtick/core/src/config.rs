//! Build-time and construction-time configuration

use core::fmt;

use crate::Duration;

/// Number of counts in one revolution of an 8-bit timer
pub const COUNTER_STEPS: u32 = 256;

/// Prescaler divisors offered by the 8-bit AVR timers
pub const SUPPORTED_PRESCALERS: [u16; 7] = [1, 8, 32, 64, 128, 256, 1024];

/// Clocking of a free-running 8-bit tick timer
///
/// The compare-match interrupt fires once per counter revolution, so the
/// quantum is `prescaler * 256` CPU cycles. Constructed in `const` context,
/// an invalid combination fails the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickConfig {
    cpu_hz: u32,
    prescaler: u16,
}

impl TickConfig {
    /// 16 MHz core clock with the /64 prescaler: 1024 us per tick
    pub const DEFAULT: Self = Self::new(16_000_000, 64);

    /// Create a tick configuration
    ///
    /// # Panics
    ///
    /// If the prescaler is not one of [`SUPPORTED_PRESCALERS`], or the
    /// revolution time is not a whole number of microseconds.
    pub const fn new(cpu_hz: u32, prescaler: u16) -> Self {
        let mut supported = false;
        let mut i = 0;
        while i < SUPPORTED_PRESCALERS.len() {
            if SUPPORTED_PRESCALERS[i] == prescaler {
                supported = true;
            }
            i += 1;
        }
        assert!(supported, "unsupported timer prescaler");

        let cycles = prescaler as u64 * COUNTER_STEPS as u64 * 1_000_000;
        assert!(cpu_hz > 0, "CPU frequency must be non-zero");
        assert!(
            cycles % cpu_hz as u64 == 0,
            "tick quantum is not a whole number of microseconds"
        );
        assert!(cycles / cpu_hz as u64 <= u32::MAX as u64, "tick quantum too long");

        Self { cpu_hz, prescaler }
    }

    /// CPU clock frequency in hertz
    pub const fn cpu_hz(&self) -> u32 {
        self.cpu_hz
    }

    /// Timer prescaler divisor
    pub const fn prescaler(&self) -> u16 {
        self.prescaler
    }

    /// Clock advance per compare-match interrupt
    pub const fn quantum(&self) -> Duration {
        let cycles = self.prescaler as u64 * COUNTER_STEPS as u64 * 1_000_000;
        Duration::from_micros((cycles / self.cpu_hz as u64) as u32)
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TickConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz/{} ({})", self.cpu_hz, self.prescaler, self.quantum())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TickConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}Hz/{}", self.cpu_hz, self.prescaler);
    }
}

/// What the dispatcher does when a task has missed whole periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUp {
    /// Realign to the first period boundary after now; missed periods are lost
    Skip,
    /// Replay up to `max` missed periods, one per tick, then skip the rest
    Replay {
        /// Upper bound on queued replays
        max: u8,
    },
}

/// Whether the tick timer keeps running once the last task is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePolicy {
    /// Leave the timer running; the clock keeps advancing
    KeepRunning,
    /// Stop the timer when the registry empties; the next registration
    /// restarts it
    StopWhenIdle,
}

/// Runtime policy of a scheduler instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub catch_up: CatchUp,
    pub idle_policy: IdlePolicy,
    /// Longest a callback may run before the dispatch counts as an overrun
    pub callback_budget: Duration,
}

impl SchedulerConfig {
    /// Skip missed periods, keep the timer running, 1 ms callback budget
    pub const DEFAULT: Self = Self {
        catch_up: CatchUp::Skip,
        idle_policy: IdlePolicy::KeepRunning,
        callback_budget: Duration::from_millis(1),
    };

    /// Creates a new scheduler configuration builder.
    pub const fn builder() -> SchedulerConfigBuilder {
        SchedulerConfigBuilder {
            config: Self::DEFAULT,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builder for scheduler configuration, usable in `const` context
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    /// Sets the catch-up policy for overrun tasks.
    pub const fn catch_up(mut self, catch_up: CatchUp) -> Self {
        self.config.catch_up = catch_up;
        self
    }

    /// Sets the timer policy for an empty registry.
    pub const fn idle_policy(mut self, idle_policy: IdlePolicy) -> Self {
        self.config.idle_policy = idle_policy;
        self
    }

    /// Sets the per-callback time budget.
    pub const fn callback_budget(mut self, budget: Duration) -> Self {
        self.config.callback_budget = budget;
        self
    }

    /// Builds the configuration.
    pub const fn build(self) -> SchedulerConfig {
        self.config
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CatchUp {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CatchUp::Skip => defmt::write!(fmt, "Skip"),
            CatchUp::Replay { max } => defmt::write!(fmt, "Replay({})", max),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IdlePolicy {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            IdlePolicy::KeepRunning => defmt::write!(fmt, "KeepRunning"),
            IdlePolicy::StopWhenIdle => defmt::write!(fmt, "StopWhenIdle"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SchedulerConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "SchedulerConfig{{ catch_up: {}, idle: {}, budget: {} }}",
            self.catch_up,
            self.idle_policy,
            self.callback_budget
        );
    }
}
