//! Host port of the isrtick scheduler
//!
//! On Linux/Unix there is no timer peripheral to program, so [`ThreadTick`]
//! spawns a ticker thread in its place. The thread sleeps to absolute
//! deadlines, so late wakeups do not accumulate, and calls a plain `fn()`
//! trampoline once per quantum, which plays the role of the interrupt vector:
//!
//! ```no_run
//! use isrtick_posix::{PosixScheduler, ThreadTick};
//! use isrtick_sched::Duration;
//!
//! static SCHEDULER: PosixScheduler<8> =
//!     PosixScheduler::new(ThreadTick::new(Duration::from_millis(1), tick));
//!
//! fn tick() {
//!     SCHEDULER.on_tick();
//! }
//!
//! fn heartbeat() {
//!     println!("alive at {}", SCHEDULER.now());
//! }
//!
//! let _task = SCHEDULER.spawn(500, heartbeat).unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! ```
//!
//! Critical sections come from the `critical-section` crate's `std`
//! implementation: a process-wide reentrant lock stands in for masking
//! interrupts.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant as StdInstant;

use isrtick_core::{Duration, TickSource};
use isrtick_sched::Scheduler;
use log::{debug, error, info};

/// Scheduler driven by a [`ThreadTick`]
pub type PosixScheduler<const N: usize> = Scheduler<ThreadTick, N>;

/// Tick handler invoked from the ticker thread
pub type TickHandler = fn();

/// Shortest quantum accepted by [`ThreadTick::new`]: 10 kHz
pub const MIN_QUANTUM: Duration = Duration::from_micros(100);

struct Ticker {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU32>,
    handle: JoinHandle<()>,
}

/// Tick source backed by a dedicated thread
pub struct ThreadTick {
    quantum: Duration,
    handler: TickHandler,
    ticker: Option<Ticker>,
}

impl ThreadTick {
    /// Create a stopped ticker calling `handler` once per `quantum`
    ///
    /// # Panics
    ///
    /// If `quantum` is shorter than [`MIN_QUANTUM`].
    pub const fn new(quantum: Duration, handler: TickHandler) -> Self {
        assert!(
            quantum.as_micros() >= MIN_QUANTUM.as_micros(),
            "tick quantum too short for a host thread"
        );
        Self {
            quantum,
            handler,
            ticker: None,
        }
    }

    /// Check whether a ticker thread is active
    pub fn is_active(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|t| t.running.load(Ordering::SeqCst))
    }

    /// Ticks delivered by the current ticker thread
    pub fn ticks(&self) -> u32 {
        self.ticker
            .as_ref()
            .map_or(0, |t| t.ticks.load(Ordering::SeqCst))
    }
}

impl TickSource for ThreadTick {
    fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Spawn the ticker thread; a no-op while one is active
    fn start(&mut self) {
        if self.is_active() {
            return;
        }

        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU32::new(0));
        let period = std::time::Duration::from_micros(u64::from(self.quantum.as_micros()));
        let handler = self.handler;

        let handle = {
            let running = Arc::clone(&running);
            let ticks = Arc::clone(&ticks);
            thread::Builder::new()
                .name("isrtick-ticker".into())
                .spawn(move || ticker_thread(period, handler, &running, &ticks))
        };

        match handle {
            Ok(handle) => {
                info!("ticker thread started, period {:?}", period);
                self.ticker = Some(Ticker {
                    running,
                    ticks,
                    handle,
                });
            }
            Err(err) => error!("failed to spawn ticker thread: {}", err),
        }
    }

    /// Signal the ticker thread to exit
    ///
    /// The scheduler stops its source with interrupts masked, and the
    /// thread needs the same lock to deliver a tick, so this does not wait
    /// for it. The thread re-checks the flag under that lock, so no tick is
    /// delivered once `stop` has returned; it exits at its next deadline.
    fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.running.store(false, Ordering::SeqCst);
            debug!(
                "ticker thread {:?} signalled after {} ticks",
                ticker.handle.thread().id(),
                ticker.ticks.load(Ordering::SeqCst)
            );
        }
    }
}

impl Drop for ThreadTick {
    fn drop(&mut self) {
        self.stop();
    }
}

fn ticker_thread(
    period: std::time::Duration,
    handler: TickHandler,
    running: &AtomicBool,
    ticks: &AtomicU32,
) {
    let mut next_tick = StdInstant::now();

    loop {
        // Absolute deadline: oversleeping one tick shortens the next sleep
        next_tick += period;
        let now = StdInstant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }

        // `stop` clears the flag inside a critical section, so checking it
        // under the same lock rules out a tick after `stop` returns
        let delivered = critical_section::with(|_| {
            if !running.load(Ordering::SeqCst) {
                return false;
            }
            handler();
            true
        });
        if !delivered {
            break;
        }
        ticks.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() {}

    #[test]
    fn test_new_is_stopped() {
        let tick = ThreadTick::new(Duration::from_millis(10), noop);
        assert!(!tick.is_active());
        assert_eq!(tick.ticks(), 0);
        assert_eq!(tick.quantum(), Duration::from_millis(10));
    }

    #[test]
    #[should_panic(expected = "tick quantum too short")]
    fn test_rejects_tiny_quantum() {
        let _ = ThreadTick::new(Duration::from_micros(10), noop);
    }

    #[test]
    fn test_stop_without_start_is_harmless() {
        let mut tick = ThreadTick::new(Duration::from_millis(1), noop);
        tick.stop();
        assert!(!tick.is_active());
    }
}
