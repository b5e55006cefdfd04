//! Scheduler context: clock, registry and tick source in one object
//!
//! Interrupt handlers cannot take parameters, so a port keeps one
//! `Scheduler` in a `static` and its vector calls [`Scheduler::on_tick`] on
//! it. Every foreground mutation of the registry runs inside a critical
//! section, which on the target masks interrupts so the dispatcher never sees
//! a half-linked list.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use heapless::Vec;
use isrtick_core::{
    Clock, Duration, Error, IdlePolicy, Instant, ManualTick, Result, SchedulerConfig,
    TickSource,
};
use log::debug;

use crate::driver::TimerDriver;
use crate::registry::{Callback, Registry, TaskId};
use crate::stats::SchedulerStats;
use crate::task::Task;

/// Periodic task scheduler for up to `N` tasks
pub struct Scheduler<T: TickSource, const N: usize> {
    pub(crate) clock: Clock,
    pub(crate) registry: Mutex<RefCell<Registry<N>>>,
    pub(crate) driver: Mutex<RefCell<TimerDriver<T>>>,
    pub(crate) stats: Mutex<Cell<SchedulerStats>>,
    pub(crate) config: SchedulerConfig,
}

impl<T: TickSource, const N: usize> Scheduler<T, N> {
    /// Create a scheduler with the default configuration
    pub const fn new(source: T) -> Self {
        Self::with_config(source, SchedulerConfig::DEFAULT)
    }

    /// Create a scheduler with an explicit configuration
    pub const fn with_config(source: T, config: SchedulerConfig) -> Self {
        Self {
            clock: Clock::new(),
            registry: Mutex::new(RefCell::new(Registry::new())),
            driver: Mutex::new(RefCell::new(TimerDriver::new(source))),
            stats: Mutex::new(Cell::new(SchedulerStats::new())),
            config,
        }
    }

    /// Current value of the monotonic clock
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Runtime policy of this scheduler
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Snapshot of the runtime counters
    pub fn stats(&self) -> SchedulerStats {
        critical_section::with(|cs| self.stats.borrow(cs).get())
    }

    /// Reset the runtime counters to zero
    pub fn reset_stats(&self) {
        critical_section::with(|cs| self.stats.borrow(cs).set(SchedulerStats::new()));
    }

    /// Check whether the tick source has been started
    pub fn is_timer_running(&self) -> bool {
        critical_section::with(|cs| self.driver.borrow_ref(cs).is_running())
    }

    /// Inspect the tick source
    pub fn with_source<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        critical_section::with(|cs| f(self.driver.borrow_ref(cs).source()))
    }

    /// Tick interrupt entry point
    ///
    /// Advances the clock by one quantum, then dispatches every due task,
    /// all inside one critical section. Returns the number of callbacks
    /// invoked.
    pub fn on_tick(&self) -> usize {
        critical_section::with(|cs| {
            let quantum = self.driver.borrow_ref(cs).quantum();
            self.clock.advance_in(cs, quantum);

            let stats = self.stats.borrow(cs);
            let mut updated = stats.get();
            updated.on_tick();
            stats.set(updated);

            self.scan(cs)
        })
    }

    /// Register a task due one `period` from now
    ///
    /// The first registration starts the tick source.
    pub fn register(&self, period: Duration, callback: Callback) -> Result<TaskId> {
        if !period.is_valid_period() {
            return Err(Error::InvalidPeriod);
        }
        let id = critical_section::with(|cs| {
            let mut registry = self.registry.borrow_ref_mut(cs);
            if registry.is_full() {
                return Err(Error::RegistryFull);
            }
            self.driver.borrow_ref_mut(cs).configure();

            let due = self.clock.now_in(cs).wrapping_add(period);
            registry.insert(period, due, callback)
        })?;
        debug!("{} registered, period {}", id, period);
        Ok(id)
    }

    /// Remove a task from the registry
    pub fn unregister(&self, id: TaskId) -> Result<()> {
        critical_section::with(|cs| {
            let mut registry = self.registry.borrow_ref_mut(cs);
            registry.remove(id)?;
            if registry.is_empty() && self.config.idle_policy == IdlePolicy::StopWhenIdle {
                self.driver.borrow_ref_mut(cs).teardown();
            }
            Ok(())
        })?;
        debug!("{} unregistered", id);
        Ok(())
    }

    /// Change a task's period; the pending due time is kept
    pub fn set_period(&self, id: TaskId, period: Duration) -> Result<()> {
        if !period.is_valid_period() {
            return Err(Error::InvalidPeriod);
        }
        critical_section::with(|cs| {
            let mut registry = self.registry.borrow_ref_mut(cs);
            let descriptor = registry.get_mut(id).ok_or(Error::UnknownTask)?;
            descriptor.period = period;
            Ok(())
        })
    }

    /// A task's period
    pub fn period(&self, id: TaskId) -> Result<Duration> {
        critical_section::with(|cs| {
            let registry = self.registry.borrow_ref(cs);
            registry.get(id).map(|d| d.period()).ok_or(Error::UnknownTask)
        })
    }

    /// Absolute clock value of a task's next dispatch
    pub fn timeout(&self, id: TaskId) -> Result<Instant> {
        critical_section::with(|cs| {
            let registry = self.registry.borrow_ref(cs);
            registry.get(id).map(|d| d.next_due()).ok_or(Error::UnknownTask)
        })
    }

    /// Time left until a task's next dispatch, zero if overdue
    pub fn when(&self, id: TaskId) -> Result<Duration> {
        critical_section::with(|cs| {
            let now = self.clock.now_in(cs);
            let registry = self.registry.borrow_ref(cs);
            registry
                .get(id)
                .map(|d| d.next_due().remaining(now))
                .ok_or(Error::UnknownTask)
        })
    }

    /// Check whether a handle refers to a registered task
    pub fn is_registered(&self, id: TaskId) -> bool {
        critical_section::with(|cs| self.registry.borrow_ref(cs).contains(id))
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.registry.borrow_ref(cs).len())
    }

    /// Check if no task is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered tasks in dispatch order
    pub fn task_ids(&self) -> Vec<TaskId, N> {
        critical_section::with(|cs| {
            let mut ids = Vec::new();
            for (id, _) in self.registry.borrow_ref(cs).iter() {
                // Cannot overflow: the registry holds at most N tasks
                let _ = ids.push(id);
            }
            ids
        })
    }

    /// Create and register a task with a period in milliseconds
    ///
    /// The task is unregistered when the returned handle is dropped.
    pub fn spawn(&self, period_ms: u32, callback: Callback) -> Result<Task<'_, T, N>> {
        Task::new(self, period_ms, callback)
    }
}

impl<const N: usize> Scheduler<ManualTick, N> {
    /// Move the clock forward without a tick, as if the CPU had been busy
    ///
    /// Called from a callback it models a callback that overruns; called
    /// between ticks it models time passing with the tick interrupt held
    /// off. No task is dispatched until the next [`on_tick`](Self::on_tick).
    /// Only a simulated scheduler offers this; a hardware clock is advanced
    /// by its timer alone:
    ///
    /// ```compile_fail
    /// use isrtick_sched::{Duration, Scheduler, TickSource};
    ///
    /// fn stall<T: TickSource>(scheduler: &Scheduler<T, 4>) {
    ///     scheduler.simulate_stall(Duration::from_millis(1));
    /// }
    /// ```
    ///
    /// Nor can foreground code dispatch tasks outside the tick:
    ///
    /// ```compile_fail
    /// use isrtick_sched::{Duration, ManualTick, Scheduler};
    ///
    /// let scheduler: Scheduler<ManualTick, 4> =
    ///     Scheduler::new(ManualTick::new(Duration::from_millis(1)));
    /// scheduler.scan();
    /// ```
    pub fn simulate_stall(&self, by: Duration) -> Instant {
        self.clock.advance(by)
    }
}

#[cfg(feature = "defmt")]
impl<T: TickSource, const N: usize> defmt::Format for Scheduler<T, N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Scheduler{{ now: {}, tasks: {}/{}, running: {} }}",
            self.now(),
            self.len(),
            N,
            self.is_timer_running()
        );
    }
}
