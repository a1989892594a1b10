//! Emitter throughput benchmarks
//!
//! Covers creation, subscription, emission fan-out and unsubscription.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use zephyr_events::{Emitter, EventKey, Listener};

#[derive(Debug, Clone)]
struct TestEvent {
    id: u64,
    message: &'static str,
}

fn test_event() -> TestEvent {
    TestEvent { id: 1, message: "test" }
}

fn bench_create(c: &mut Criterion) {
    c.bench_function("emitter_create", |b| {
        b.iter(|| black_box(Emitter::<TestEvent>::new()))
    });
}

fn bench_subscribe(c: &mut Criterion) {
    // Fresh emitter per batch so the handler set does not grow without bound
    c.bench_function("emitter_on", |b| {
        b.iter_batched(
            Emitter::<TestEvent>::new,
            |emitter| {
                emitter
                    .on("test", Listener::event(|e: &TestEvent| {
                        black_box(e.id);
                    }))
                    .unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitter_emit");
    let event = test_event();

    for handlers in [1usize, 10, 100] {
        let emitter: Emitter<TestEvent> = Emitter::new();
        for _ in 0..handlers {
            emitter
                .on("test", Listener::event(|e: &TestEvent| {
                    black_box(e.message);
                }))
                .unwrap();
        }

        group.throughput(Throughput::Elements(handlers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(handlers), &handlers, |b, _| {
            b.iter(|| emitter.emit("test", black_box(&event)))
        });
    }

    group.finish();
}

fn bench_emit_wildcard(c: &mut Criterion) {
    let emitter: Emitter<TestEvent> = Emitter::new();
    let event = test_event();

    emitter
        .on("test", Listener::event(|e: &TestEvent| {
            black_box(e.id);
        }))
        .unwrap();
    emitter
        .on("*", Listener::wildcard(|key: &EventKey, e: &TestEvent| {
            black_box((key, e.id));
        }))
        .unwrap();

    c.bench_function("emitter_emit_wildcard", |b| {
        b.iter(|| emitter.emit("test", black_box(&event)))
    });
}

fn bench_unsubscribe(c: &mut Criterion) {
    let emitter: Emitter<TestEvent> = Emitter::new();

    c.bench_function("emitter_on_unsubscribe", |b| {
        b.iter(|| {
            let unsubscribe = emitter
                .on("test", Listener::event(|e: &TestEvent| {
                    black_box(e.id);
                }))
                .unwrap();
            unsubscribe.unsubscribe();
        })
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_subscribe,
    bench_emit,
    bench_emit_wildcard,
    bench_unsubscribe
);
criterion_main!(benches);
