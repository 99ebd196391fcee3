//! End-to-end allocation scenarios.
//!
//! These pin down the first-registered, first-served admission rules and the
//! per-pass callback contract using the shared producer doubles.

use ledger_core::capacity::{AggregationMode, StaticCapacitySource};
use ledger_core::producer::ProducerId;
use ledger_core::resource::ResourceName;
use ledger_core::scheduler::ProductionScheduler;
use ledger_core::status::{total_balance, StockHolder};
use ledger_test_utils::fixtures::{
    amounts, consumer, power_contention, production_chain, source, FACTORY_X, FACTORY_Y,
    POWER_PLANT,
};
use ledger_test_utils::producers::{Call, CallLog, RecordingProducer, ScriptedProducer};

// =============================================================================
// Contention scenarios
// =============================================================================

#[test]
fn power_shared_between_two_factories() {
    let mut scheduler = power_contention();
    let report = scheduler.process_production_tick();

    let x = report.outcome(FACTORY_X).unwrap();
    let y = report.outcome(FACTORY_Y).unwrap();
    assert!(x.can_produce);
    assert!(!y.can_produce);
    assert_eq!(y.coverage.get("power"), Some(3));

    let power = scheduler.ledger().resource_info("power").unwrap();
    assert_eq!(power.consumption, 7);
    assert_eq!(power.available, 3);

    let y = scheduler.producer(FACTORY_Y).unwrap();
    assert_eq!(y.last_result, Some(false));
    assert_eq!(y.ticks_produced, 0);
}

#[test]
fn later_producer_leaves_ledger_as_earlier_left_it() {
    let mut scheduler = ProductionScheduler::new();
    scheduler.register(ProducerId(0), source(&[("power", 10), ("water", 10)]));
    scheduler.register(ProducerId(1), consumer(&[("power", 6), ("water", 2)]));
    scheduler.register(ProducerId(2), consumer(&[("water", 5), ("power", 6)]));

    let report = scheduler.process_production_tick();

    assert!(!report.outcome(ProducerId(2)).unwrap().can_produce);
    let ledger = scheduler.ledger();
    assert_eq!(ledger.available("power"), 4);
    assert_eq!(ledger.available("water"), 8);
    assert_eq!(ledger.resource_info("water").unwrap().consumption, 2);
}

#[test]
fn reversing_registration_reverses_winner() {
    let mut scheduler = ProductionScheduler::new();
    scheduler.register(POWER_PLANT, source(&[("power", 10)]));
    scheduler.register(FACTORY_Y, consumer(&[("power", 5)]));
    scheduler.register(FACTORY_X, consumer(&[("power", 7)]));

    let report = scheduler.process_production_tick();

    assert!(report.outcome(FACTORY_Y).unwrap().can_produce);
    assert!(!report.outcome(FACTORY_X).unwrap().can_produce);
    assert_eq!(scheduler.ledger().available("power"), 5);
}

#[test]
fn unproduced_resource_starves_consumer() {
    let mut scheduler = ProductionScheduler::new();
    scheduler.register(ProducerId(9), consumer(&[("grain", 1)]));

    let report = scheduler.process_production_tick();
    let z = report.outcome(ProducerId(9)).unwrap();

    assert!(!z.can_produce);
    assert_eq!(z.coverage.get("grain"), Some(0));
    let grain = report.resource("grain").unwrap();
    assert_eq!(grain.production, 0);
    assert_eq!(grain.consumption, 0);
}

#[test]
fn production_chain_outcomes() {
    let mut scheduler = production_chain();
    let report = scheduler.process_production_tick();

    let results: Vec<_> = report.outcomes.iter().map(|o| o.can_produce).collect();
    assert_eq!(results, vec![true, true, true, false, false]);

    let workshop = report.outcome(ProducerId(4)).unwrap();
    assert_eq!(workshop.coverage, amounts(&[("steel", 2)]));
    let housing = report.outcome(ProducerId(5)).unwrap();
    assert_eq!(housing.coverage, amounts(&[("power", 6), ("water", 5)]));

    let ledger = scheduler.ledger();
    assert_eq!(ledger.available("power"), 7);
    assert_eq!(ledger.available("water"), 5);
    assert_eq!(ledger.available("ore"), 2);
    assert_eq!(ledger.available("steel"), 2);
    assert_eq!(ledger.available("tools"), 1);
}

#[test]
fn every_tick_starts_from_full_capacity() {
    let mut scheduler = power_contention();
    for _ in 0..5 {
        let report = scheduler.process_production_tick();
        assert!(report.outcome(FACTORY_X).unwrap().can_produce);
        assert!(!report.outcome(FACTORY_Y).unwrap().can_produce);
    }
    let x = scheduler.producer(FACTORY_X).unwrap();
    assert_eq!(x.ticks_produced, 5);
}

// =============================================================================
// Registry changes between ticks
// =============================================================================

#[test]
fn unregistered_producer_gets_no_callback_and_rejoins_at_end() {
    let log = CallLog::new();
    let mut scheduler = ProductionScheduler::new();
    let plant = RecordingProducer::new(ProducerId(0), amounts(&[]), amounts(&[("power", 10)]), &log);
    let x = RecordingProducer::new(FACTORY_X, amounts(&[("power", 7)]), amounts(&[]), &log);
    let y = RecordingProducer::new(FACTORY_Y, amounts(&[("power", 5)]), amounts(&[]), &log);
    scheduler.register(plant.id(), plant);
    scheduler.register(x.id(), x);
    scheduler.register(y.id(), y);

    let y = scheduler.unregister(FACTORY_Y).unwrap();
    scheduler.process_production_tick();
    assert_eq!(log.ticks(), vec![(ProducerId(0), true), (FACTORY_X, true)]);

    log.clear();
    scheduler.register(FACTORY_Y, y);
    // Re-adding X is a no-op: it keeps its original slot.
    let x_again = RecordingProducer::new(FACTORY_X, amounts(&[("power", 1)]), amounts(&[]), &log);
    assert!(!scheduler.register(FACTORY_X, x_again));
    scheduler.process_production_tick();

    assert_eq!(
        log.ticks(),
        vec![(ProducerId(0), true), (FACTORY_X, true), (FACTORY_Y, false)]
    );
    assert_eq!(
        scheduler.producer_ids(),
        vec![ProducerId(0), FACTORY_X, FACTORY_Y]
    );
}

#[test]
fn rejoining_producer_loses_priority() {
    let mut scheduler = power_contention();
    let x = scheduler.unregister(FACTORY_X).unwrap();
    scheduler.register(FACTORY_X, x);

    let report = scheduler.process_production_tick();
    assert!(report.outcome(FACTORY_Y).unwrap().can_produce);
    assert!(!report.outcome(FACTORY_X).unwrap().can_produce);
}

// =============================================================================
// Callback contract
// =============================================================================

#[test]
fn aggregation_completes_before_admission() {
    let log = CallLog::new();
    let mut scheduler = ProductionScheduler::new();
    for id in 0..3 {
        let producer = RecordingProducer::new(
            ProducerId(id),
            amounts(&[("power", 1)]),
            amounts(&[("power", 1)]),
            &log,
        );
        scheduler.register(ProducerId(id), producer);
    }

    scheduler.process_production_tick();
    let calls = log.calls();

    let last_production = calls
        .iter()
        .rposition(|c| matches!(c, Call::Production(_)))
        .unwrap();
    let first_needs = calls
        .iter()
        .position(|c| matches!(c, Call::Needs(_)))
        .unwrap();
    assert!(last_production < first_needs);
}

#[test]
fn each_producer_decided_before_next_is_asked() {
    let log = CallLog::new();
    let mut scheduler = ProductionScheduler::new();
    for id in 0..3 {
        let producer = RecordingProducer::new(
            ProducerId(id),
            amounts(&[("power", 4)]),
            amounts(&[("power", 4)]),
            &log,
        );
        scheduler.register(ProducerId(id), producer);
    }

    scheduler.process_production_tick();
    let admission: Vec<_> = log
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, Call::Production(_)))
        .collect();

    let mut expected = Vec::new();
    for id in 0..3 {
        let id = ProducerId(id);
        expected.push(Call::Needs(id));
        expected.push(Call::Coverage(id, amounts(&[("power", 4)])));
        expected.push(Call::Tick(id, true));
    }
    assert_eq!(admission, expected);
}

#[test]
fn exactly_one_callback_per_producer_per_tick() {
    let log = CallLog::new();
    let mut scheduler = ProductionScheduler::new();
    for id in 0..6 {
        let producer = RecordingProducer::new(
            ProducerId(id),
            amounts(&[("power", 3)]),
            amounts(&[("power", 2)]),
            &log,
        );
        scheduler.register(ProducerId(id), producer);
    }

    for _ in 0..3 {
        log.clear();
        scheduler.process_production_tick();
        let ids: Vec<_> = log.ticks().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, scheduler.producer_ids());
    }
}

#[test]
fn needs_are_requeried_every_tick() {
    let mut scheduler = ProductionScheduler::new();
    scheduler.register(
        ProducerId(0),
        ScriptedProducer::new(vec![], vec![amounts(&[("power", 5)])]),
    );
    scheduler.register(
        ProducerId(1),
        ScriptedProducer::new(
            vec![amounts(&[("power", 3)]), amounts(&[("power", 9)])],
            vec![],
        ),
    );

    for _ in 0..4 {
        scheduler.process_production_tick();
    }

    let results = &scheduler.producer(ProducerId(1)).unwrap().results;
    assert_eq!(results, &vec![true, false, true, false]);
}

// =============================================================================
// Capacity strategies and clock
// =============================================================================

#[test]
fn external_totals_drive_admission() {
    let mut scheduler = power_contention();
    scheduler.set_aggregation_mode(AggregationMode::ExternalTotals);
    scheduler.set_capacity_source(Some(Box::new(
        StaticCapacitySource::new().with_production("power", 12.0),
    )));

    let report = scheduler.process_production_tick();
    assert!(report.outcome(FACTORY_X).unwrap().can_produce);
    assert!(report.outcome(FACTORY_Y).unwrap().can_produce);

    scheduler.set_capacity_source(None);
    let report = scheduler.process_production_tick();
    assert_eq!(report.satisfied_count(), 1); // only the plant, which needs nothing
}

#[test]
fn advance_drives_whole_ticks() {
    let mut scheduler = power_contention();
    scheduler.set_tick_rate(20.0);

    let mut total = 0;
    for _ in 0..30 {
        total += scheduler.advance(1.0 / 60.0).len();
    }
    assert_eq!(total, 10);
    assert_eq!(scheduler.current_tick(), 10);
    assert_eq!(scheduler.producer(FACTORY_X).unwrap().ticks_produced, 10);
}

#[test]
fn stock_inclusive_balance() {
    struct Silo(i64);

    impl StockHolder for Silo {
        fn stock(&self, resource: &ResourceName) -> i64 {
            if resource.as_str() == "power" {
                self.0
            } else {
                0
            }
        }
    }

    let mut scheduler = power_contention();
    scheduler.process_production_tick();

    let silos = [Silo(4), Silo(6)];
    let power = ResourceName::from("power");
    assert_eq!(total_balance(scheduler.ledger(), &power, &silos), 13);
}
