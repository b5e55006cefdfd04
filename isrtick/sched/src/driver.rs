//! Lazy, idempotent ownership of the tick source

use isrtick_core::{Duration, TickSource};
use log::info;

/// Tick source plus the "already configured" flag
pub(crate) struct TimerDriver<T> {
    source: T,
    running: bool,
}

impl<T: TickSource> TimerDriver<T> {
    pub(crate) const fn new(source: T) -> Self {
        Self {
            source,
            running: false,
        }
    }

    /// Start the source unless it already runs
    pub(crate) fn configure(&mut self) {
        if self.running {
            return;
        }
        self.source.start();
        self.running = true;
        info!("tick source started, quantum {}", self.source.quantum());
    }

    /// Stop the source if it runs
    pub(crate) fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.source.stop();
        self.running = false;
        info!("tick source stopped");
    }

    pub(crate) fn quantum(&self) -> Duration {
        self.source.quantum()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn source(&self) -> &T {
        &self.source
    }
}
