#![no_std]
#![forbid(unsafe_code)]

//! # isrtick scheduler
//!
//! Cooperative periodic task scheduler dispatched from a hardware timer
//! interrupt. A [`Scheduler`] owns the monotonic clock, a fixed-capacity
//! [`Registry`] of task descriptors and the [`TickSource`] that drives it.
//! Each tick advances the clock by one quantum and then invokes every task
//! whose due time has been reached, directly from interrupt context.
//!
//! ```
//! use isrtick_sched::{Duration, ManualTick, Scheduler};
//!
//! fn blink() {}
//!
//! static SCHEDULER: Scheduler<ManualTick, 4> =
//!     Scheduler::new(ManualTick::new(Duration::from_millis(1)));
//!
//! let task = SCHEDULER.spawn(10, blink).unwrap();
//! for _ in 0..10 {
//!     SCHEDULER.on_tick();
//! }
//! assert_eq!(SCHEDULER.stats().dispatches, 1);
//! drop(task);
//! assert!(SCHEDULER.is_empty());
//! ```
//!
//! Callbacks run with interrupts masked and must return well within their
//! own period. One that overruns is realigned to its next period boundary;
//! the missed invocations are not replayed unless [`CatchUp::Replay`] is
//! configured.

mod dispatch;
mod driver;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod task;

pub use isrtick_core::*;
pub use registry::{Callback, Descriptor, Registry, TaskId};
pub use scheduler::Scheduler;
pub use stats::SchedulerStats;
pub use task::Task;

/// Default registry capacity used by the ports
pub const DEFAULT_MAX_TASKS: usize = 8;
