use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures_lite::future::block_on;
use futures_wait::future::WaitSet;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("wait_first 10", |b| b.iter(|| wait_first_test(black_box(10))));
    c.bench_function("wait_first 100", |b| b.iter(|| wait_first_test(black_box(100))));
    c.bench_function("wait_first 1000", |b| b.iter(|| wait_first_test(black_box(1000))));
    c.bench_function("wait_all 10", |b| b.iter(|| wait_all_test(black_box(10))));
    c.bench_function("wait_all 100", |b| b.iter(|| wait_all_test(black_box(100))));
    c.bench_function("wait_all 1000", |b| b.iter(|| wait_all_test(black_box(1000))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

/// Only the last future in the set ever completes.
pub(crate) fn wait_first_test(max: usize) {
    block_on(async {
        let set: WaitSet<_, _> = (0..max)
            .map(|n| {
                let polls = if n + 1 == max { 2 } else { usize::MAX };
                (n, Countdown::new(polls))
            })
            .collect();
        let partition = set.wait_first().unwrap().await;
        assert_eq!(partition.done().len(), 1);
        assert_eq!(partition.pending().len(), max - 1);
    })
}

pub(crate) fn wait_all_test(max: usize) {
    block_on(async {
        let set: WaitSet<_, _> = (0..max).map(|n| (n, Countdown::new(n % 8))).collect();
        let done = set.wait_all().await;
        assert_eq!(done.len(), max);
    })
}

/// A future which will _eventually_ be ready, but needs to be polled N times before it is.
struct Countdown {
    remaining: usize,
}

impl Countdown {
    fn new(remaining: usize) -> Self {
        Self { remaining }
    }
}

impl Future for Countdown {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        // Only the slot that just made progress asks to be polled again.
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
