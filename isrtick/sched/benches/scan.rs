use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use isrtick_sched::{Duration, ManualTick, Scheduler};

fn noop() {}

fn bench_on_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_tick");

    for tasks in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            let scheduler: Scheduler<ManualTick, 16> =
                Scheduler::new(ManualTick::new(Duration::from_millis(1)));
            let handles: Vec<_> = (0..tasks)
                .map(|i| scheduler.spawn(1 + i as u32, noop).unwrap())
                .collect();

            b.iter(|| black_box(scheduler.on_tick()));
            drop(handles);
        });
    }

    group.finish();
}

fn bench_on_tick_idle(c: &mut Criterion) {
    let scheduler: Scheduler<ManualTick, 16> =
        Scheduler::new(ManualTick::new(Duration::from_millis(1)));
    let _handles: Vec<_> = (0..16)
        .map(|_| scheduler.spawn(60_000, noop).unwrap())
        .collect();

    c.bench_function("on_tick_nothing_due", |b| b.iter(|| black_box(scheduler.on_tick())));
}

criterion_group!(benches, bench_on_tick, bench_on_tick_idle);
criterion_main!(benches);
