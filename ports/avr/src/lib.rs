//! ATmega328P port of the isrtick scheduler
//!
//! The port owns one global [`Scheduler`] driven by the compare-match
//! interrupt of the timer chosen at build time (`timer0`/`timer2`,
//! `channel-a`/`channel-b`, `cpu-8mhz`). The timer is programmed on the first
//! registration, so an application that never creates a task never touches
//! it. Callbacks run inside the interrupt handler and must return quickly.
//!
//! ```ignore
//! fn blink() { /* toggle a pin */ }
//!
//! #[avr_device::entry]
//! fn main() -> ! {
//!     let _task = isrtick_avr::spawn(500, blink).unwrap_or_else(|_| loop {});
//!     unsafe { avr_device::interrupt::enable() };
//!     loop { avr_device::asm::sleep() }
//! }
//! ```

#![no_std]
#![feature(abi_avr_interrupt)]

mod timer;

pub use isrtick_sched::{Duration, Error, Instant, Result, SchedulerStats, TaskId};
pub use timer::{AvrTimer, CPU_HZ, PRESCALER, TICK};

use isrtick_sched::{Callback, Scheduler, Task};

/// Number of tasks the global scheduler can hold
pub const MAX_TASKS: usize = isrtick_sched::DEFAULT_MAX_TASKS;

/// Scheduler type of this port
pub type AvrScheduler = Scheduler<AvrTimer, MAX_TASKS>;

/// Periodic task bound to the global scheduler
pub type AvrTask = Task<'static, AvrTimer, MAX_TASKS>;

/// The scheduler every task of this port registers with
pub static SCHEDULER: AvrScheduler = Scheduler::new(AvrTimer::new());

/// Microseconds since the timer was configured, wrapping at 2^32
pub fn now() -> Instant {
    SCHEDULER.now()
}

/// Create a task on the global scheduler and register it
pub fn spawn(period_ms: u32, callback: Callback) -> Result<AvrTask> {
    SCHEDULER.spawn(period_ms, callback)
}

/// Create a task on the global scheduler without registering it
///
/// Meant for `static` tasks; call [`Task::begin`] once the system is up.
pub const fn deferred(period_ms: u32, callback: Callback) -> AvrTask {
    Task::deferred(&SCHEDULER, period_ms, callback)
}

/// Runtime counters of the global scheduler
pub fn stats() -> SchedulerStats {
    SCHEDULER.stats()
}

#[cfg(all(feature = "timer0", feature = "channel-a"))]
#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    SCHEDULER.on_tick();
}

#[cfg(all(feature = "timer0", feature = "channel-b"))]
#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPB() {
    SCHEDULER.on_tick();
}

#[cfg(all(feature = "timer2", feature = "channel-a"))]
#[avr_device::interrupt(atmega328p)]
fn TIMER2_COMPA() {
    SCHEDULER.on_tick();
}

#[cfg(all(feature = "timer2", feature = "channel-b"))]
#[avr_device::interrupt(atmega328p)]
fn TIMER2_COMPB() {
    SCHEDULER.on_tick();
}
