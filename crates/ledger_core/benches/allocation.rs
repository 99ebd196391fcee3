//! Allocation pass benchmarks for ledger_core.
//!
//! Run with: `cargo bench -p ledger_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_core::producer::{ProducerId, StaticProducer};
use ledger_core::scheduler::ProductionScheduler;
use ledger_test_utils::fixtures::{amounts, production_chain};

const RESOURCES: [&str; 6] = ["power", "water", "ore", "steel", "grain", "tools"];

/// Build `count` producers cycling through needs and contributions so that
/// roughly half of them are starved every pass.
fn crowded_scheduler(count: u64) -> ProductionScheduler<StaticProducer> {
    let mut scheduler = ProductionScheduler::new();
    for i in 0..count {
        let a = RESOURCES[(i % 6) as usize];
        let b = RESOURCES[((i + 1) % 6) as usize];
        let producer = StaticProducer::new(
            amounts(&[(a, 3), (b, 2)]),
            amounts(&[(b, 2)]),
        );
        scheduler.register(ProducerId(i), producer);
    }
    scheduler
}

/// Runs allocation pass benchmarks for the ledger_core crate.
pub fn allocation_benchmark(c: &mut Criterion) {
    c.bench_function("production_chain_tick", |b| {
        let mut scheduler = production_chain();
        b.iter(|| black_box(scheduler.process_production_tick()));
    });

    let mut group = c.benchmark_group("crowded_tick");
    for count in [10u64, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut scheduler = crowded_scheduler(count);
            b.iter(|| black_box(scheduler.process_production_tick()));
        });
    }
    group.finish();
}

criterion_group!(benches, allocation_benchmark);
criterion_main!(benches);
