//! Two periodic tasks on the host, driven by the ticker thread
//!
//! Run with `RUST_LOG=debug` to see registration and timer events, or
//! `RUST_LOG=trace` for every dispatch. Ctrl-C prints the scheduler
//! statistics and exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration as StdDuration;

use isrtick_posix::{PosixScheduler, ThreadTick};
use isrtick_sched::TickConfig;
use log::info;

/// Same quantum an ATmega328P at 16 MHz with the /64 prescaler produces
const TICK: TickConfig = TickConfig::DEFAULT;

static SCHEDULER: PosixScheduler<4> = PosixScheduler::new(ThreadTick::new(TICK.quantum(), tick));
static LED: AtomicBool = AtomicBool::new(false);
static RUNNING: AtomicBool = AtomicBool::new(true);

fn tick() {
    SCHEDULER.on_tick();
}

fn toggle_led() {
    let on = !LED.fetch_xor(true, Ordering::Relaxed);
    println!("[{}] led {}", SCHEDULER.now(), if on { "on" } else { "off" });
}

fn report() {
    let stats = SCHEDULER.stats();
    println!(
        "[{}] {} ticks, {} dispatches, {} skipped",
        SCHEDULER.now(),
        stats.ticks,
        stats.dispatches,
        stats.skipped_periods
    );
}

fn main() {
    env_logger::init();

    ctrlc::set_handler(|| RUNNING.store(false, Ordering::SeqCst))
        .unwrap_or_else(|err| log::warn!("cannot install Ctrl-C handler: {}", err));

    info!("tick {}", TICK);

    let blink = match SCHEDULER.spawn(1_000, toggle_led) {
        Ok(task) => task,
        Err(err) => {
            eprintln!("cannot register blink task: {}", err);
            return;
        }
    };
    let reporter = match SCHEDULER.spawn(5_000, report) {
        Ok(task) => task,
        Err(err) => {
            eprintln!("cannot register report task: {}", err);
            return;
        }
    };

    while RUNNING.load(Ordering::SeqCst) {
        thread::sleep(StdDuration::from_millis(100));
    }

    drop(reporter);
    drop(blink);
    report();
}
