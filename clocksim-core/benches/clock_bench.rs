#[macro_use]
extern crate criterion;

use criterion::Criterion;

use clocksim_core::{Inbox, LamportClock};

fn bench_clock_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("lamport_clock");
    let clock = LamportClock::new(0);
    group.bench_function("apply_local", |b| b.iter(|| clock.apply_local()));
    group.bench_function("apply_received", |b| {
        let mut incoming = 0u64;
        b.iter(|| {
            incoming = incoming.wrapping_add(3);
            clock.apply_received(incoming)
        })
    });
    group.finish();
}

fn bench_inbox_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbox_throughput");

    for depth in [1usize, 128, 16384] {
        group.throughput(criterion::Throughput::Elements(depth as u64));
        group.bench_function(format!("depth_{}", depth), |b| {
            let inbox = Inbox::new();
            b.iter(|| {
                for i in 0..depth {
                    inbox.push(i as u64);
                }
                while inbox.pop().is_some() {}
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clock_updates, bench_inbox_push_pop);
criterion_main!(benches);
