//! Test fixtures and helpers.
//!
//! Pre-built producers and schedulers for consistent testing.

use ledger_core::producer::{ProducerId, StaticProducer};
use ledger_core::resource::ResourceAmounts;
use ledger_core::scheduler::ProductionScheduler;

/// Build an ordered amount map from pairs.
#[must_use]
pub fn amounts(pairs: &[(&str, i64)]) -> ResourceAmounts {
    pairs.iter().map(|&(name, amount)| (name, amount)).collect()
}

/// A producer that only contributes the given resources.
#[must_use]
pub fn source(pairs: &[(&str, i64)]) -> StaticProducer {
    StaticProducer::source(amounts(pairs))
}

/// A producer that only needs the given resources.
#[must_use]
pub fn consumer(pairs: &[(&str, i64)]) -> StaticProducer {
    StaticProducer::consumer(amounts(pairs))
}

/// Id of the capacity source in [`power_contention`].
pub const POWER_PLANT: ProducerId = ProducerId(100);
/// Id of the first consumer in [`power_contention`].
pub const FACTORY_X: ProducerId = ProducerId(1);
/// Id of the second consumer in [`power_contention`].
pub const FACTORY_Y: ProducerId = ProducerId(2);

/// Ten units of power shared by X (needs 7) and Y (needs 5), registered in
/// that order after the plant.
#[must_use]
pub fn power_contention() -> ProductionScheduler<StaticProducer> {
    let mut scheduler = ProductionScheduler::new();
    scheduler.register(POWER_PLANT, source(&[("power", 10)]));
    scheduler.register(FACTORY_X, consumer(&[("power", 7)]));
    scheduler.register(FACTORY_Y, consumer(&[("power", 5)]));
    scheduler
}

/// A small production chain: plant -> mine -> smelter -> workshop, with
/// more demand than supply further down the chain.
#[must_use]
pub fn production_chain() -> ProductionScheduler<StaticProducer> {
    let mut scheduler = ProductionScheduler::new();
    scheduler.register(ProducerId(1), source(&[("power", 20), ("water", 8)]));
    scheduler.register(
        ProducerId(2),
        StaticProducer::new(amounts(&[("power", 5)]), amounts(&[("ore", 6)])),
    );
    scheduler.register(
        ProducerId(3),
        StaticProducer::new(
            amounts(&[("power", 8), ("ore", 4), ("water", 3)]),
            amounts(&[("steel", 2)]),
        ),
    );
    scheduler.register(
        ProducerId(4),
        StaticProducer::new(
            amounts(&[("steel", 3), ("power", 4)]),
            amounts(&[("tools", 1)]),
        ),
    );
    scheduler.register(ProducerId(5), consumer(&[("power", 6), ("water", 6)]));
    scheduler
}
