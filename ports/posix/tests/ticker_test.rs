//! Wall-clock tests of the ticker thread; bounds are loose to absorb
//! scheduling jitter on busy hosts

use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration as StdDuration;

use isrtick_posix::{PosixScheduler, ThreadTick};
use isrtick_sched::{Duration, IdlePolicy, SchedulerConfig};

#[test]
fn test_ticker_drives_periodic_task() {
    static SCHED: PosixScheduler<4> =
        PosixScheduler::new(ThreadTick::new(Duration::from_millis(2), tick));
    static RUNS: AtomicU32 = AtomicU32::new(0);

    fn tick() {
        SCHED.on_tick();
    }

    fn task() {
        RUNS.fetch_add(1, Ordering::SeqCst);
    }

    assert!(!SCHED.with_source(ThreadTick::is_active));
    let handle = SCHED.spawn(20, task).unwrap();
    assert!(SCHED.with_source(ThreadTick::is_active));

    thread::sleep(StdDuration::from_millis(210));
    drop(handle);

    let runs = RUNS.load(Ordering::SeqCst);
    assert!((4..=11).contains(&runs), "expected ~10 dispatches, got {}", runs);
    assert!(SCHED.now().micros() >= 100_000);
    assert!(SCHED.stats().ticks >= 50);
}

#[test]
fn test_ticker_stops_when_registry_empties() {
    const CONFIG: SchedulerConfig = SchedulerConfig::builder()
        .idle_policy(IdlePolicy::StopWhenIdle)
        .build();
    static SCHED: PosixScheduler<4> =
        PosixScheduler::with_config(ThreadTick::new(Duration::from_millis(1), tick), CONFIG);

    fn tick() {
        SCHED.on_tick();
    }

    fn task() {}

    let handle = SCHED.spawn(5, task).unwrap();
    thread::sleep(StdDuration::from_millis(30));
    drop(handle);

    // No tick may land once the drop has returned, not even one already
    // waiting for the lock
    let frozen = SCHED.now();
    let ticks = SCHED.stats().ticks;
    assert!(!SCHED.is_timer_running());
    assert!(!SCHED.with_source(ThreadTick::is_active));

    thread::sleep(StdDuration::from_millis(20));
    assert_eq!(SCHED.now(), frozen);
    assert_eq!(SCHED.stats().ticks, ticks);

    // A restarted ticker runs alone: ticks track the wall clock
    let restarted = std::time::Instant::now();
    let again = SCHED.spawn(5, task).unwrap();
    assert!(SCHED.with_source(ThreadTick::is_active));
    thread::sleep(StdDuration::from_millis(50));
    drop(again);
    let elapsed = restarted.elapsed().as_millis() as u32;
    assert!(SCHED.stats().ticks - ticks <= elapsed + 2);
}
