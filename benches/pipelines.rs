//! Compares the cost of running the same `filter() -> map() -> sum` pipeline through this crate's `Observable`s,
//! through `tokio-stream` / `futures` `Stream`s and through plain iterators (the baseline),
//! plus measures subject fan-out and the thread hopping done by `observe_on()` on each of its drain modes.
//!
//! Run with `cargo bench --bench pipelines`

use criterion::{
    criterion_group,
    criterion_main,
    Criterion,
    BenchmarkGroup,
    measurement::WallTime,
};
use std::{
    hint::black_box,
    sync::{
        Arc,
        atomic::{
            AtomicBool,
            AtomicU64,
            Ordering::{Relaxed, Acquire, Release},
        },
    },
};
use once_cell::sync::Lazy;
use reactive_observables::prelude::*;
use tokio_stream::StreamExt;


const PIPELINE_LEN: u64 = 1<<14;

static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| tokio::runtime::Builder::new_multi_thread()
    .worker_threads(2)
    .enable_all()
    .build()
    .expect("Couldn't build the benchmarks' tokio runtime"));


/// Benchmarks the same-thread throughput of a synchronous `filter() -> map() -> sum` pipeline
fn bench_same_thread_pipelines(criterion: &mut Criterion) {

    let mut group = criterion.benchmark_group("Same-thread PIPELINES");

    let bench_id = format!("Iterator (baseline)");
    group.bench_function(bench_id, |bencher| bencher.iter(|| {
        let sum: u64 = (0..PIPELINE_LEN)
            .filter(|n| n % 3 != 0)
            .map(|n| n * 2)
            .sum();
        black_box(sum)
    }));

    let bench_id = format!("Observable");
    let sum = Arc::new(AtomicU64::new(0));
    let sum_ref = Arc::clone(&sum);
    let observable = Observable::<u64, ()>::from_iter(0..PIPELINE_LEN)
        .filter(|n| n % 3 != 0)
        .map(|n| n * 2);
    group.bench_function(bench_id, |bencher| bencher.iter(|| {
        let sum_ref = Arc::clone(&sum_ref);
        observable.subscribe_next(move |n| { sum_ref.fetch_add(n, Relaxed); });
        black_box(sum.swap(0, Relaxed))
    }));

    let bench_id = format!("tokio-stream Stream");
    group.bench_function(bench_id, |bencher| bencher.iter(|| {
        let stream = tokio_stream::iter(0..PIPELINE_LEN)
            .filter(|n| n % 3 != 0)
            .map(|n| n * 2);
        let sum = futures::executor::block_on(stream.fold(0_u64, |sum, n| sum + n));
        black_box(sum)
    }));

    group.finish();
}

/// Benchmarks how long it takes for a [PublishSubject] to deliver each item to its subscribers
fn bench_subject_fan_out(criterion: &mut Criterion) {

    let mut group = criterion.benchmark_group("Subject FAN-OUT");

    for subscribers in [1, 4, 16] {
        let subject = PublishSubject::<u64, ()>::new();
        let bag = DisposeBag::new();
        let received = Arc::new(AtomicU64::new(0));
        for _ in 0..subscribers {
            let received = Arc::clone(&received);
            subject.as_observable()
                .subscribe_next(move |_| { received.fetch_add(1, Relaxed); })
                .disposed_by(&bag);
        }
        let bench_id = format!("PublishSubject with {subscribers} subscribers");
        group.bench_function(bench_id, |bencher| bencher.iter(|| {
            subject.on_next(black_box(7));
        }));
        black_box(received.load(Relaxed));
    }

    group.finish();
}

/// Benchmarks the inter-thread throughput of `observe_on()`: a producer thread pushes [PIPELINE_LEN] items
/// that are consumed by tokio workers -- the measurement ends when the consumer sees the completion signal
fn bench_observe_on(criterion: &mut Criterion) {

    let mut group = criterion.benchmark_group("Inter-thread OBSERVE_ON");

    const BATCHED: u64 = ConstConfig {
        observe_on_buffer: 1<<15,
        overflow_strategy: OverflowStrategies::Unbounded,
        drain_mode:        DrainModes::Batched,
    }.into();
    const PER_ITEM: u64 = ConstConfig {
        observe_on_buffer: 1<<15,
        overflow_strategy: OverflowStrategies::Unbounded,
        drain_mode:        DrainModes::PerItem,
    }.into();

    fn bench_it<const CONFIG: u64>(group: &mut BenchmarkGroup<WallTime>, bench_id: String) {
        let scheduler = TokioScheduler::from_handle(RUNTIME.handle().clone());
        let observable = Observable::<u64, ()>::from_iter(0..PIPELINE_LEN)
            .observe_on_configured::<CONFIG, _>(scheduler);
        group.bench_function(bench_id, |bencher| bencher.iter(|| {
            let done = Arc::new(AtomicBool::new(false));
            let done_ref = Arc::clone(&done);
            observable.subscribe_all(|n| { black_box(n); },
                                     |_| {},
                                     move || done_ref.store(true, Release));
            while !done.load(Acquire) {
                std::hint::spin_loop();
            }
        }));
    }

    bench_it::<BATCHED>(&mut group, format!("observe_on(Batched)"));
    bench_it::<PER_ITEM>(&mut group, format!("observe_on(PerItem)"));

    group.finish();
}

criterion_group!(benches, bench_same_thread_pipelines, bench_subject_fan_out, bench_observe_on);
criterion_main!(benches);
