//! Owned periodic task handle
//!
//! Creating a [`Task`] registers it and dropping it unregisters it, so the
//! registry entry lives exactly as long as the handle. [`Task::deferred`]
//! is the `const` form for tasks placed in statics before the system is up;
//! they start counting on [`Task::begin`].

use core::cell::Cell;

use critical_section::Mutex;
use isrtick_core::{Duration, Error, Instant, Result, TickSource};

use crate::registry::{Callback, TaskId};
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Registration {
    id: Option<TaskId>,
    /// Last period requested through this handle
    period: Duration,
}

/// A periodic callback registered with a [`Scheduler`]
pub struct Task<'s, T: TickSource, const N: usize> {
    scheduler: &'s Scheduler<T, N>,
    callback: Callback,
    registration: Mutex<Cell<Registration>>,
}

impl<'s, T: TickSource, const N: usize> Task<'s, T, N> {
    /// Create a task and register it immediately
    ///
    /// The first dispatch happens `period_ms` milliseconds from now.
    pub fn new(scheduler: &'s Scheduler<T, N>, period_ms: u32, callback: Callback) -> Result<Self> {
        let task = Self::deferred(scheduler, period_ms, callback);
        task.begin()?;
        Ok(task)
    }

    /// Create a task without registering it
    pub const fn deferred(scheduler: &'s Scheduler<T, N>, period_ms: u32, callback: Callback) -> Self {
        Self {
            scheduler,
            callback,
            registration: Mutex::new(Cell::new(Registration {
                id: None,
                period: Duration::from_millis(period_ms),
            })),
        }
    }

    /// Register the task if it is not registered yet
    ///
    /// A no-op for a task that is already registered.
    pub fn begin(&self) -> Result<()> {
        let current = self.registration();
        if current.id.is_some_and(|id| self.scheduler.is_registered(id)) {
            return Ok(());
        }
        let id = self.scheduler.register(current.period, self.callback)?;
        self.set_registration(Registration {
            id: Some(id),
            ..current
        });
        Ok(())
    }

    /// Handle of the registry entry, if registered
    pub fn id(&self) -> Option<TaskId> {
        self.registration().id
    }

    /// Check whether the task is in the registry
    pub fn is_registered(&self) -> bool {
        self.id().is_some_and(|id| self.scheduler.is_registered(id))
    }

    /// Interval between dispatches
    pub fn period(&self) -> Duration {
        let current = self.registration();
        current
            .id
            .and_then(|id| self.scheduler.period(id).ok())
            .unwrap_or(current.period)
    }

    /// Interval between dispatches, in whole milliseconds
    pub fn period_ms(&self) -> u32 {
        self.period().as_millis()
    }

    /// Change the interval; the pending dispatch keeps its due time
    pub fn set_period(&self, period: Duration) -> Result<()> {
        if !period.is_valid_period() {
            return Err(Error::InvalidPeriod);
        }
        let current = self.registration();
        if let Some(id) = current.id {
            match self.scheduler.set_period(id, period) {
                Ok(()) | Err(Error::UnknownTask) => {}
                Err(err) => return Err(err),
            }
        }
        self.set_registration(Registration { period, ..current });
        Ok(())
    }

    /// Change the interval, in milliseconds
    pub fn set_period_ms(&self, period_ms: u32) -> Result<()> {
        self.set_period(Duration::from_millis(period_ms))
    }

    /// Absolute clock value of the next dispatch
    pub fn timeout(&self) -> Result<Instant> {
        self.scheduler.timeout(self.id().ok_or(Error::UnknownTask)?)
    }

    /// Time left until the next dispatch, zero if overdue
    pub fn when(&self) -> Result<Duration> {
        self.scheduler.when(self.id().ok_or(Error::UnknownTask)?)
    }

    fn registration(&self) -> Registration {
        critical_section::with(|cs| self.registration.borrow(cs).get())
    }

    fn set_registration(&self, registration: Registration) {
        critical_section::with(|cs| self.registration.borrow(cs).set(registration));
    }
}

impl<T: TickSource, const N: usize> Drop for Task<'_, T, N> {
    fn drop(&mut self) {
        if let Some(id) = self.id() {
            // Already gone if the scheduler rejected the handle
            let _ = self.scheduler.unregister(id);
        }
    }
}
