//! Message queue benchmark suite.
//!
//! Benchmarks the hot paths of a send burst while the connection is down:
//! - Recipient normalization
//! - Enqueue then batch take at different queue depths
//! - Requeue of an interrupted drain
//!
//! Run with: cargo bench --bench queue
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use session_lifecycle::session::MessageQueue;
use session_lifecycle::{PendingMessage, Recipient};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const QUEUE_DEPTHS: &[usize] = &[10, 100, 1_000];

const RAW_RECIPIENTS: &[&str] = &["923001234567", "0300-1234567", "+92 (300) 123 4567"];

fn message(index: usize) -> PendingMessage {
    let recipient = Recipient::normalize("03001234567", "92").expect("valid recipient");
    PendingMessage::new(recipient, format!("message {index}"))
}

// ============================================================================
// Benchmark: Recipient Normalization
// ============================================================================

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for raw in RAW_RECIPIENTS {
        group.bench_with_input(BenchmarkId::from_parameter(raw), raw, |b, raw| {
            b.iter(|| Recipient::normalize(black_box(raw), "92"));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Enqueue and Take
// ============================================================================

fn bench_enqueue_take(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_take");

    for &depth in QUEUE_DEPTHS {
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("fifo", depth), &depth, |b, &depth| {
            b.iter(|| {
                let queue = MessageQueue::new();
                for i in 0..depth {
                    queue.enqueue(message(i));
                }
                black_box(queue.take_batch())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Requeue After Interrupted Drain
// ============================================================================

fn bench_requeue_front(c: &mut Criterion) {
    let mut group = c.benchmark_group("requeue_front");

    for &depth in QUEUE_DEPTHS {
        group.bench_with_input(BenchmarkId::new("half", depth), &depth, |b, &depth| {
            b.iter_batched(
                || {
                    let queue = MessageQueue::new();
                    for i in 0..depth / 2 {
                        queue.enqueue(message(i));
                    }
                    let unsent: Vec<_> = (0..depth / 2).map(message).collect();
                    (queue, unsent)
                },
                |(queue, unsent)| {
                    queue.requeue_front(unsent);
                    black_box(queue.len())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(
    benches,
    bench_normalize,
    bench_enqueue_take,
    bench_requeue_front
);
criterion_main!(benches);
