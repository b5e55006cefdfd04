//! Dispatcher: invoke due callbacks and reschedule them

use critical_section::CriticalSection;
use heapless::Vec;
use isrtick_core::{CatchUp, Instant, TickSource};
use log::{trace, warn};

use crate::registry::{Descriptor, TaskId};
use crate::scheduler::Scheduler;

impl<T: TickSource, const N: usize> Scheduler<T, N> {
    /// Dispatch every task whose due time has been reached
    ///
    /// Runs inside the tick's critical section, so foreground code never
    /// observes a scan in progress: a task dropped from the foreground is
    /// removed either before or after the whole scan. Due tasks are
    /// collected first and then invoked one by one without any registry
    /// borrow held, so a callback may register, cancel or re-period tasks.
    /// A task cancelled by an earlier callback of the same scan is not
    /// invoked; a task registered during the scan waits for the next tick.
    ///
    /// Returns the number of callbacks invoked.
    pub(crate) fn scan(&self, cs: CriticalSection<'_>) -> usize {
        let now = self.clock.now_in(cs);
        let mut due: Vec<TaskId, N> = Vec::new();
        for (id, descriptor) in self.registry.borrow_ref(cs).iter() {
            if descriptor.next_due().is_reached(now) {
                // Cannot overflow: the registry holds at most N tasks
                let _ = due.push(id);
            }
        }

        due.into_iter().filter(|&id| self.dispatch(cs, id)).count()
    }

    fn dispatch(&self, cs: CriticalSection<'_>, id: TaskId) -> bool {
        let found = {
            let registry = self.registry.borrow_ref(cs);
            registry.get(id).map(|d| d.callback())
        };
        let Some(callback) = found else {
            return false;
        };
        let started = self.clock.now_in(cs);

        trace!("dispatch {} at {}", id, started);
        callback();

        let now = self.clock.now_in(cs);
        let spent = now.elapsed_since(started);
        let overrun = spent > self.config.callback_budget;
        if overrun {
            warn!("{} ran {} (budget {})", id, spent, self.config.callback_budget);
        }

        let skipped = self
            .registry
            .borrow_ref_mut(cs)
            .get_mut(id)
            .map_or(0, |d| reschedule(d, now, self.config.catch_up));

        let stats = self.stats.borrow(cs);
        let mut updated = stats.get();
        updated.on_dispatch(skipped, overrun);
        stats.set(updated);
        true
    }
}

/// Advance `next_due` by one period, then apply the catch-up policy
///
/// `now` is read after the callback returned. Returns the number of whole
/// periods dropped.
pub(crate) fn reschedule(descriptor: &mut Descriptor, now: Instant, policy: CatchUp) -> u32 {
    let period = descriptor.period;
    descriptor.next_due = descriptor.next_due.wrapping_add(period);

    let lag = descriptor.next_due.lag(now);
    if lag < 0 {
        return 0;
    }

    // Boundaries at or before now, counting next_due itself
    let missed = lag as u32 / period.as_micros() + 1;
    let allowed = match policy {
        CatchUp::Skip => 0,
        CatchUp::Replay { max } => max as u32,
    };
    if missed <= allowed {
        return 0;
    }

    let skipped = missed - allowed;
    descriptor.next_due = Instant::from_micros(
        descriptor
            .next_due
            .micros()
            .wrapping_add(skipped.wrapping_mul(period.as_micros())),
    );
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use isrtick_core::Duration;

    fn noop() {}

    fn descriptor(period_ms: u32, due_ms: u32) -> Descriptor {
        let mut registry = Registry::<1>::new();
        let id = registry
            .insert(
                Duration::from_millis(period_ms),
                Instant::from_micros(due_ms * 1_000),
                noop,
            )
            .unwrap();
        *registry.get(id).unwrap()
    }

    fn ms(value: u32) -> Instant {
        Instant::from_micros(value * 1_000)
    }

    #[test]
    fn on_time_dispatch_adds_one_period() {
        let mut d = descriptor(500, 500);
        assert_eq!(reschedule(&mut d, ms(500), CatchUp::Skip), 0);
        assert_eq!(d.next_due(), ms(1_000));
    }

    #[test]
    fn late_dispatch_does_not_drift() {
        let mut d = descriptor(500, 500);
        assert_eq!(reschedule(&mut d, ms(730), CatchUp::Skip), 0);
        assert_eq!(d.next_due(), ms(1_000));
    }

    #[test]
    fn skip_realigns_past_now() {
        let mut d = descriptor(500, 500);
        assert_eq!(reschedule(&mut d, ms(1_200), CatchUp::Skip), 1);
        assert_eq!(d.next_due(), ms(1_500));

        let mut d = descriptor(500, 500);
        assert_eq!(reschedule(&mut d, ms(1_000), CatchUp::Skip), 1);
        assert_eq!(d.next_due(), ms(1_500));
    }

    #[test]
    fn replay_keeps_bounded_backlog() {
        let mut d = descriptor(100, 100);
        // Boundaries 200..=600 missed: five of them
        assert_eq!(reschedule(&mut d, ms(650), CatchUp::Replay { max: 2 }), 3);
        assert_eq!(d.next_due(), ms(500));
    }

    #[test]
    fn reschedule_across_wraparound() {
        let period = Duration::from_millis(1);
        let mut registry = Registry::<1>::new();
        let id = registry
            .insert(period, Instant::from_micros(u32::MAX - 499), noop)
            .unwrap();
        let mut d = *registry.get(id).unwrap();

        assert_eq!(reschedule(&mut d, Instant::from_micros(u32::MAX - 400), CatchUp::Skip), 0);
        assert_eq!(d.next_due().micros(), 500);
    }
}
