//! Dispatcher timing tests, driven by simulated ticks on the host

use std::sync::Mutex;

use isrtick_sched::{
    CatchUp, Duration, Instant, ManualTick, Scheduler, SchedulerConfig, TaskId,
};

const QUANTUM: Duration = Duration::from_millis(1);

fn run_until<const N: usize>(scheduler: &Scheduler<ManualTick, N>, micros: u32) {
    while scheduler.now().micros() < micros {
        scheduler.on_tick();
    }
}

#[test]
fn test_no_drift_over_many_invocations() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static FIRED: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    fn record() {
        FIRED.lock().unwrap().push(SCHED.now().micros());
    }

    let _task = SCHED.spawn(7, record).unwrap();
    for _ in 0..700 {
        SCHED.on_tick();
    }

    let fired = FIRED.lock().unwrap();
    assert_eq!(fired.len(), 100);
    assert_eq!(fired[0], 7_000);
    assert!(fired.windows(2).all(|w| w[1] - w[0] == 7_000));
}

#[test]
fn test_two_tasks_registration_order_tie_break() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static FIRED: Mutex<Vec<(&'static str, u32)>> = Mutex::new(Vec::new());

    fn slow() {
        FIRED.lock().unwrap().push(("2000ms", SCHED.now().micros()));
    }

    fn fast() {
        FIRED.lock().unwrap().push(("1000ms", SCHED.now().micros()));
    }

    let _slow = SCHED.spawn(2_000, slow).unwrap();
    let _fast = SCHED.spawn(1_000, fast).unwrap();
    for _ in 0..2_000 {
        SCHED.on_tick();
    }

    let fired = FIRED.lock().unwrap();
    assert_eq!(
        fired.as_slice(),
        &[
            ("1000ms", 1_000_000),
            ("1000ms", 2_000_000),
            ("2000ms", 2_000_000),
        ]
    );
}

#[test]
fn test_stalled_callback_lands_on_aligned_boundary() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static FIRED: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    fn stall_once() {
        let mut fired = FIRED.lock().unwrap();
        fired.push(SCHED.now().micros());
        if fired.len() == 1 {
            // Simulate a callback that keeps the CPU for 700 ms
            SCHED.simulate_stall(Duration::from_millis(700));
        }
    }

    let _task = SCHED.spawn(500, stall_once).unwrap();
    run_until(&SCHED, 2_000_000);

    let fired = FIRED.lock().unwrap();
    // The stall ends at 1200 ms: next firing is 1500 ms, not 1700 ms
    assert_eq!(fired.as_slice(), &[500_000, 1_500_000, 2_000_000]);

    let stats = SCHED.stats();
    assert_eq!(stats.skipped_periods, 1);
    assert_eq!(stats.overruns, 1);
}

#[test]
fn test_overrun_never_bursts() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static FIRED: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    fn stall_once() {
        let mut fired = FIRED.lock().unwrap();
        fired.push(SCHED.now().micros());
        if fired.len() == 1 {
            SCHED.simulate_stall(Duration::from_millis(1_200));
        }
    }

    let _task = SCHED.spawn(500, stall_once).unwrap();
    run_until(&SCHED, 3_000_000);

    let fired = FIRED.lock().unwrap();
    // Completion at 1700 ms; first multiple of 500 ms after it is 2000 ms
    assert_eq!(fired.as_slice(), &[500_000, 2_000_000, 2_500_000, 3_000_000]);
    assert_eq!(SCHED.stats().skipped_periods, 2);
}

#[test]
fn test_bounded_replay_policy() {
    const CONFIG: SchedulerConfig = SchedulerConfig::builder()
        .catch_up(CatchUp::Replay { max: 1 })
        .build();
    static SCHED: Scheduler<ManualTick, 4> =
        Scheduler::with_config(ManualTick::new(QUANTUM), CONFIG);
    static FIRED: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    fn stall_once() {
        let mut fired = FIRED.lock().unwrap();
        fired.push(SCHED.now().micros());
        if fired.len() == 1 {
            SCHED.simulate_stall(Duration::from_millis(1_200));
        }
    }

    let _task = SCHED.spawn(500, stall_once).unwrap();
    run_until(&SCHED, 2_000_000);

    let fired = FIRED.lock().unwrap();
    // 1000 ms is dropped, 1500 ms is replayed on the first tick after the stall
    assert_eq!(fired.as_slice(), &[500_000, 1_701_000, 2_000_000]);
    assert_eq!(SCHED.stats().skipped_periods, 1);
}

#[test]
fn test_set_period_only_affects_future() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static FIRED: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    fn record() {
        FIRED.lock().unwrap().push(SCHED.now().micros());
    }

    let task = SCHED.spawn(100, record).unwrap();
    run_until(&SCHED, 50_000);

    task.set_period_ms(300).unwrap();
    assert_eq!(task.timeout().unwrap(), Instant::from_micros(100_000));
    assert_eq!(task.period_ms(), 300);

    run_until(&SCHED, 700_000);
    let fired = FIRED.lock().unwrap();
    assert_eq!(fired.as_slice(), &[100_000, 400_000, 700_000]);
    assert_eq!(task.timeout().unwrap(), Instant::from_micros(1_000_000));
}

#[test]
fn test_callback_cancelling_later_task() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static VICTIM: Mutex<Option<TaskId>> = Mutex::new(None);
    static VICTIM_RUNS: Mutex<u32> = Mutex::new(0);

    fn killer() {
        if let Some(id) = VICTIM.lock().unwrap().take() {
            SCHED.unregister(id).unwrap();
        }
    }

    fn victim() {
        *VICTIM_RUNS.lock().unwrap() += 1;
    }

    let victim_id = SCHED.register(Duration::from_millis(10), victim).unwrap();
    *VICTIM.lock().unwrap() = Some(victim_id);
    let _killer = SCHED.spawn(10, killer).unwrap();

    // Both due on the same tick; the killer is registered last so runs first
    run_until(&SCHED, 30_000);

    assert_eq!(*VICTIM_RUNS.lock().unwrap(), 0);
    assert!(!SCHED.is_registered(victim_id));
    assert_eq!(SCHED.len(), 1);
}

#[test]
fn test_callback_registration_waits_for_next_tick() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static CHILD: Mutex<Option<TaskId>> = Mutex::new(None);

    fn child() {}

    fn parent() {
        let mut slot = CHILD.lock().unwrap();
        if slot.is_none() {
            *slot = Some(SCHED.register(Duration::from_millis(5), child).unwrap());
        }
    }

    let _parent = SCHED.spawn(10, parent).unwrap();
    run_until(&SCHED, 9_000);
    assert_eq!(SCHED.on_tick(), 1);

    let child_id = CHILD.lock().unwrap().expect("child registered");
    assert_eq!(SCHED.timeout(child_id).unwrap(), Instant::from_micros(15_000));
    assert_eq!(SCHED.len(), 2);
}

#[test]
fn test_dispatch_across_clock_wraparound() {
    static SCHED: Scheduler<ManualTick, 4> = Scheduler::new(ManualTick::new(QUANTUM));
    static FIRED: Mutex<Vec<Instant>> = Mutex::new(Vec::new());

    fn record() {
        FIRED.lock().unwrap().push(SCHED.now());
    }

    SCHED.simulate_stall(Duration::from_micros(u32::MAX - 10_999));
    let _task = SCHED.spawn(3, record).unwrap();
    for _ in 0..30 {
        SCHED.on_tick();
    }

    let fired = FIRED.lock().unwrap();
    assert_eq!(fired.len(), 10);
    assert!(fired.iter().any(|t| t.micros() < 1_000_000));
    assert!(fired
        .windows(2)
        .all(|w| w[1].elapsed_since(w[0]) == Duration::from_millis(3)));
}
