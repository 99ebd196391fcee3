//! The production scheduler.
//!
//! Owns the ordered producer registry and the resource ledger, and runs the
//! allocation pass once per tick. This module is the heart of the engine.
//!
//! # Pass Order
//!
//! Each call to [`ProductionScheduler::process_production_tick`] runs:
//! 1. **Reset** - every balance returns to its installed capacity
//! 2. **Aggregation** - capacity is computed (producer sum or external
//!    totals) and installed for every known resource
//! 3. **Admission** - producers are visited in registration order; each one
//!    whose needs are all available has them deducted, and every producer is
//!    notified of its result
//! 4. **Publication** - the resource-status snapshot is returned in the
//!    [`TickReport`]
//!
//! Producers registered earlier are served first. A producer that arrives
//! after a scarce resource has been drained fails outright, even if a
//! different split would have satisfied both.
//!
//! # Re-entrancy
//!
//! The pass takes `&mut self` and producers only ever receive `&mut P`, so
//! nothing can register, unregister or read the ledger mid-pass: the
//! registry is frozen for the duration of one tick.
//!
//! # Example
//!
//! ```
//! use ledger_core::producer::{ProducerId, StaticProducer};
//! use ledger_core::resource::ResourceAmounts;
//! use ledger_core::scheduler::ProductionScheduler;
//!
//! let mut scheduler = ProductionScheduler::new();
//! scheduler.register(
//!     ProducerId(1),
//!     StaticProducer::source(ResourceAmounts::new().with("power", 10)),
//! );
//! scheduler.register(
//!     ProducerId(2),
//!     StaticProducer::consumer(ResourceAmounts::new().with("power", 7)),
//! );
//!
//! let report = scheduler.process_production_tick();
//! assert!(report.outcome(ProducerId(2)).unwrap().can_produce);
//! assert_eq!(scheduler.ledger().available("power"), 3);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::capacity::{
    aggregate_production, external_production, install_capacity, AggregationMode, CapacitySource,
};
use crate::clock::TickClock;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ledger::Ledger;
use crate::producer::{Producer, ProducerId};
use crate::resource::ResourceAmounts;
use crate::status::ResourceStatus;

/// Admission result for one producer in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerOutcome {
    /// The producer.
    pub id: ProducerId,
    /// Whether every need was met and deducted.
    pub can_produce: bool,
    /// `min(available, required)` for each need checked.
    ///
    /// The check stops at the first unmet need, so needs listed after it
    /// are absent from the report.
    pub coverage: ResourceAmounts,
}

/// Everything that happened during one allocation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Pass number, starting at 1.
    pub tick: u64,
    /// Capacity strategy used for this pass.
    pub mode: AggregationMode,
    /// Per-producer results, in admission (registration) order.
    pub outcomes: Vec<ProducerOutcome>,
    /// Resource counters after every producer was processed.
    pub status: Vec<ResourceStatus>,
}

impl TickReport {
    /// Result for a given producer, if it took part in this pass.
    #[must_use]
    pub fn outcome(&self, id: ProducerId) -> Option<&ProducerOutcome> {
        self.outcomes.iter().find(|outcome| outcome.id == id)
    }

    /// Status of a given resource after the pass.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&ResourceStatus> {
        self.status.iter().find(|status| status.name.as_str() == name)
    }

    /// Number of producers allowed to produce.
    #[must_use]
    pub fn satisfied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.can_produce).count()
    }
}

/// Serialized engine state. Producers are owned by the host and are
/// re-registered after a restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineSnapshot {
    tick: u64,
    mode: AggregationMode,
    clock: TickClock,
    ledger: Ledger,
}

/// Tick-driven scheduler arbitrating a shared resource pool between producers.
pub struct ProductionScheduler<P = Box<dyn Producer>> {
    /// Registered producers in registration order.
    producers: Vec<(ProducerId, P)>,
    /// The shared pool.
    ledger: Ledger,
    /// Converts elapsed time into whole passes.
    clock: TickClock,
    /// Capacity strategy, resolved at the start of every pass.
    mode: AggregationMode,
    /// Totals provider for [`AggregationMode::ExternalTotals`].
    capacity_source: Option<Box<dyn CapacitySource>>,
    /// Completed passes.
    tick: u64,
    /// Status published by the most recent pass.
    last_status: Vec<ResourceStatus>,
    /// Log every status snapshot at info level.
    log_status: bool,
}

impl<P> fmt::Debug for ProductionScheduler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductionScheduler")
            .field(
                "producers",
                &self.producers.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            )
            .field("ledger", &self.ledger)
            .field("clock", &self.clock)
            .field("mode", &self.mode)
            .field("has_capacity_source", &self.capacity_source.is_some())
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl<P: Producer> Default for ProductionScheduler<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Producer> ProductionScheduler<P> {
    /// Create a scheduler with default settings and no producers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Create a scheduler from a configuration.
    #[must_use]
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            producers: Vec::new(),
            ledger: Ledger::new(),
            clock: TickClock::new(config.tick_rate),
            mode: config.aggregation_mode,
            capacity_source: None,
            tick: 0,
            last_status: Vec::new(),
            log_status: config.log_status,
        }
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Add a producer at the end of the admission order.
    ///
    /// Returns `false` (and drops `producer`) if `id` is already registered;
    /// the existing registration keeps its place.
    pub fn register(&mut self, id: ProducerId, producer: P) -> bool {
        if self.is_registered(id) {
            tracing::trace!(producer = %id, "Producer already registered");
            return false;
        }
        self.producers.push((id, producer));
        tracing::trace!(producer = %id, position = self.producers.len() - 1, "Producer registered");
        true
    }

    /// Remove a producer, returning it. Unknown ids are a no-op.
    pub fn unregister(&mut self, id: ProducerId) -> Option<P> {
        let position = self.producers.iter().position(|(pid, _)| *pid == id)?;
        tracing::trace!(producer = %id, "Producer unregistered");
        Some(self.producers.remove(position).1)
    }

    /// Check whether a producer is registered.
    #[must_use]
    pub fn is_registered(&self, id: ProducerId) -> bool {
        self.producers.iter().any(|(pid, _)| *pid == id)
    }

    /// Borrow a registered producer.
    #[must_use]
    pub fn producer(&self, id: ProducerId) -> Option<&P> {
        self.producers
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, producer)| producer)
    }

    /// Borrow a registered producer, failing if it is unknown.
    pub fn require_producer(&self, id: ProducerId) -> Result<&P> {
        self.producer(id).ok_or(EngineError::UnknownProducer(id))
    }

    /// Iterate producers in admission order.
    pub fn producers(&self) -> impl Iterator<Item = (ProducerId, &P)> {
        self.producers.iter().map(|(id, producer)| (*id, producer))
    }

    /// Registered ids in admission order.
    #[must_use]
    pub fn producer_ids(&self) -> Vec<ProducerId> {
        self.producers.iter().map(|(id, _)| *id).collect()
    }

    /// Number of registered producers.
    #[must_use]
    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Select the capacity strategy for subsequent passes.
    pub fn set_aggregation_mode(&mut self, mode: AggregationMode) {
        self.mode = mode;
    }

    /// Current capacity strategy.
    #[must_use]
    pub const fn aggregation_mode(&self) -> AggregationMode {
        self.mode
    }

    /// Wire (or unwire, with `None`) the external totals provider.
    pub fn set_capacity_source(&mut self, source: Option<Box<dyn CapacitySource>>) {
        self.capacity_source = source;
    }

    /// Change the tick rate. Zero or negative runs one pass per
    /// [`advance`](Self::advance) call.
    pub fn set_tick_rate(&mut self, rate: f64) {
        self.clock.set_rate(rate);
        tracing::debug!(rate, "Tick rate changed");
    }

    /// Configured tick rate.
    #[must_use]
    pub const fn tick_rate(&self) -> f64 {
        self.clock.rate()
    }

    /// The tick clock.
    #[must_use]
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Read-only access to the ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Number of completed passes.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Status published by the most recent pass.
    #[must_use]
    pub fn last_status(&self) -> &[ResourceStatus] {
        &self.last_status
    }

    // ------------------------------------------------------------------
    // Tick processing
    // ------------------------------------------------------------------

    /// Feed elapsed simulation time and run every pass that became due.
    ///
    /// Passes run strictly one after another; reports come back in order.
    pub fn advance(&mut self, delta_seconds: f64) -> Vec<TickReport> {
        self.advance_with(delta_seconds, |_| {})
    }

    /// Like [`advance`](Self::advance), but calls `before_pass` ahead of
    /// every released pass.
    ///
    /// The hook runs between passes, so it may register, unregister or
    /// reconfigure; [`current_tick`](Self::current_tick) tells it how many
    /// passes have completed.
    pub fn advance_with<F>(&mut self, delta_seconds: f64, mut before_pass: F) -> Vec<TickReport>
    where
        F: FnMut(&mut Self),
    {
        let due = self.clock.accumulate(delta_seconds);
        let mut reports = Vec::with_capacity(due as usize);
        for _ in 0..due {
            before_pass(self);
            reports.push(self.process_production_tick());
        }
        reports
    }

    /// Run one full allocation pass.
    pub fn process_production_tick(&mut self) -> TickReport {
        // 1. Opening balance
        self.ledger.reset_tick();

        // 2. Aggregation
        let totals = self.aggregate_capacity();
        install_capacity(&mut self.ledger, &totals);

        // 3. Admission, in registration order
        let mut outcomes = Vec::with_capacity(self.producers.len());
        for (id, producer) in &mut self.producers {
            let needs = producer.resource_needs();
            let (can_produce, coverage) = admit(&mut self.ledger, &needs);

            tracing::trace!(
                producer = %id,
                can_produce,
                needs = needs.len(),
                checked = coverage.len(),
                "Admission decided"
            );

            producer.set_needs_coverage(&coverage);
            producer.on_production_tick(can_produce);
            outcomes.push(ProducerOutcome {
                id: *id,
                can_produce,
                coverage,
            });
        }

        // 4. Publication
        self.tick += 1;
        self.last_status = self.ledger.snapshot();
        if self.log_status {
            for status in &self.last_status {
                tracing::info!(
                    tick = self.tick,
                    resource = %status.name,
                    production = status.production,
                    available = status.available,
                    consumption = status.consumption,
                    utilization = status.utilization_percent(),
                    "Resource status"
                );
            }
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Allocation state hash");
        }

        TickReport {
            tick: self.tick,
            mode: self.mode,
            outcomes,
            status: self.last_status.clone(),
        }
    }

    /// Compute this pass's capacity table with the selected strategy.
    fn aggregate_capacity(&self) -> ResourceAmounts {
        match self.mode {
            AggregationMode::ProducerSum => {
                aggregate_production(self.producers.iter().map(|(_, producer)| producer))
            }
            AggregationMode::ExternalTotals => match &self.capacity_source {
                Some(source) => external_production(&source.totals()),
                None => {
                    tracing::warn!(
                        tick = self.tick + 1,
                        "No capacity source wired for external totals; installing zero capacity"
                    );
                    ResourceAmounts::new()
                }
            },
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Drop every producer, pending time, resource record and tick count.
    ///
    /// Tick rate, aggregation mode and capacity source are kept.
    pub fn clear_all_data(&mut self) {
        tracing::info!(
            producers = self.producers.len(),
            resources = self.ledger.len(),
            "Clearing all allocation data"
        );
        self.producers.clear();
        self.clock.reset();
        self.ledger = Ledger::new();
        self.tick = 0;
        self.last_status.clear();
    }

    /// Deterministic hash of the tick counter and ledger.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.ledger.state_hash().hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the engine state (ledger, clock, tick, mode).
    ///
    /// Producers are not included.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = EngineSnapshot {
            tick: self.tick,
            mode: self.mode,
            clock: self.clock,
            ledger: self.ledger.clone(),
        };
        bincode::serialize(&snapshot).map_err(|e| EngineError::SnapshotEncode(e.to_string()))
    }

    /// Restore engine state from [`snapshot`](Self::snapshot) bytes.
    ///
    /// Registered producers and the capacity source are left untouched.
    pub fn restore(&mut self, data: &[u8]) -> Result<()> {
        let snapshot: EngineSnapshot =
            bincode::deserialize(data).map_err(|e| EngineError::SnapshotDecode(e.to_string()))?;
        self.tick = snapshot.tick;
        self.mode = snapshot.mode;
        self.clock = snapshot.clock;
        self.ledger = snapshot.ledger;
        self.last_status = self.ledger.snapshot();
        tracing::info!(tick = self.tick, resources = self.ledger.len(), "Engine state restored");
        Ok(())
    }
}

/// All-or-nothing admission check for one producer.
///
/// Walks `needs` in order, recording `min(available, required)` for each,
/// and stops at the first need that cannot be met. Only if every need is
/// met is anything deducted.
fn admit(ledger: &mut Ledger, needs: &ResourceAmounts) -> (bool, ResourceAmounts) {
    let mut coverage = ResourceAmounts::new();
    let mut can_produce = true;

    for (name, amount) in needs {
        ledger.ensure_exists(name.as_str());
        let required = amount.max(0);
        let available = ledger.available(name.as_str());
        coverage.insert(name.clone(), available.min(required));
        if available < required {
            can_produce = false;
            break;
        }
    }

    if can_produce {
        for (name, amount) in needs {
            let consumed = ledger.consume(name.as_str(), amount.max(0));
            debug_assert!(consumed, "consumption of {name} failed after admission");
        }
    }

    (can_produce, coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::StaticCapacitySource;
    use crate::producer::StaticProducer;

    fn amounts(pairs: &[(&str, i64)]) -> ResourceAmounts {
        pairs.iter().map(|&(n, a)| (n, a)).collect()
    }

    fn consumer(pairs: &[(&str, i64)]) -> StaticProducer {
        StaticProducer::consumer(amounts(pairs))
    }

    fn source(pairs: &[(&str, i64)]) -> StaticProducer {
        StaticProducer::source(amounts(pairs))
    }

    #[test]
    fn test_new_scheduler_is_empty() {
        let scheduler: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        assert_eq!(scheduler.current_tick(), 0);
        assert_eq!(scheduler.producer_count(), 0);
        assert!(scheduler.ledger().is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut scheduler = ProductionScheduler::new();
        assert!(scheduler.register(ProducerId(1), consumer(&[("power", 1)])));
        assert!(!scheduler.register(ProducerId(1), consumer(&[("power", 99)])));
        assert_eq!(scheduler.producer_count(), 1);
        assert_eq!(
            scheduler.producer(ProducerId(1)).unwrap().needs.get("power"),
            Some(1)
        );
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut scheduler: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        assert!(scheduler.unregister(ProducerId(7)).is_none());
        assert!(matches!(
            scheduler.require_producer(ProducerId(7)),
            Err(EngineError::UnknownProducer(ProducerId(7)))
        ));
    }

    #[test]
    fn test_first_registered_first_served() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("power", 10)]));
        scheduler.register(ProducerId(1), consumer(&[("power", 7)]));
        scheduler.register(ProducerId(2), consumer(&[("power", 5)]));

        let report = scheduler.process_production_tick();

        assert!(report.outcome(ProducerId(1)).unwrap().can_produce);
        assert!(!report.outcome(ProducerId(2)).unwrap().can_produce);
        let power = report.resource("power").unwrap();
        assert_eq!(power.production, 10);
        assert_eq!(power.consumption, 7);
        assert_eq!(power.available, 3);
    }

    #[test]
    fn test_failed_admission_deducts_nothing() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("power", 10), ("water", 1)]));
        scheduler.register(ProducerId(1), consumer(&[("power", 4), ("water", 2)]));

        let report = scheduler.process_production_tick();

        assert!(!report.outcome(ProducerId(1)).unwrap().can_produce);
        assert_eq!(scheduler.ledger().available("power"), 10);
        assert_eq!(scheduler.ledger().available("water"), 1);
    }

    #[test]
    fn test_coverage_stops_at_first_unmet_need() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("power", 2), ("water", 50)]));
        scheduler.register(
            ProducerId(1),
            consumer(&[("water", 5), ("power", 3), ("steel", 1)]),
        );

        let report = scheduler.process_production_tick();
        let outcome = report.outcome(ProducerId(1)).unwrap();

        assert!(!outcome.can_produce);
        assert_eq!(outcome.coverage.get("water"), Some(5));
        assert_eq!(outcome.coverage.get("power"), Some(2));
        assert_eq!(outcome.coverage.get("steel"), None);

        let producer = scheduler.producer(ProducerId(1)).unwrap();
        assert_eq!(producer.last_coverage, outcome.coverage);
        assert_eq!(producer.last_result, Some(false));
    }

    #[test]
    fn test_capacity_does_not_linger() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("grain", 5)]));
        scheduler.register(ProducerId(1), consumer(&[("grain", 5)]));
        assert!(scheduler.process_production_tick().outcomes[1].can_produce);

        scheduler.unregister(ProducerId(0));
        let report = scheduler.process_production_tick();
        assert!(!report.outcomes[0].can_produce);
        assert_eq!(report.resource("grain").unwrap().production, 0);
    }

    #[test]
    fn test_external_totals_replace_producer_sum() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("power", 100)]));
        scheduler.register(ProducerId(1), consumer(&[("power", 6)]));
        scheduler.set_aggregation_mode(AggregationMode::ExternalTotals);
        scheduler.set_capacity_source(Some(Box::new(
            StaticCapacitySource::new().with_production("power", 5.0),
        )));

        let report = scheduler.process_production_tick();

        assert_eq!(report.mode, AggregationMode::ExternalTotals);
        assert_eq!(report.resource("power").unwrap().production, 5);
        assert!(!report.outcome(ProducerId(1)).unwrap().can_produce);
    }

    #[test]
    fn test_missing_capacity_source_installs_zero() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("power", 100)]));
        scheduler.register(ProducerId(1), consumer(&[("power", 1)]));
        scheduler.process_production_tick();

        scheduler.set_aggregation_mode(AggregationMode::ExternalTotals);
        let report = scheduler.process_production_tick();

        assert!(!report.outcome(ProducerId(1)).unwrap().can_produce);
        assert_eq!(report.resource("power").unwrap().production, 0);
    }

    #[test]
    fn test_negative_need_is_treated_as_zero() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("power", 3)]));
        scheduler.register(ProducerId(1), consumer(&[("power", -4)]));

        let report = scheduler.process_production_tick();
        let outcome = report.outcome(ProducerId(1)).unwrap();
        assert!(outcome.can_produce);
        assert_eq!(outcome.coverage.get("power"), Some(0));
        assert_eq!(scheduler.ledger().available("power"), 3);
    }

    #[test]
    fn test_advance_runs_due_ticks() {
        let mut scheduler: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        scheduler.set_tick_rate(4.0);

        assert_eq!(scheduler.advance(0.6).len(), 2);
        assert_eq!(scheduler.advance(0.15).len(), 1);
        assert_eq!(scheduler.current_tick(), 3);

        let reports = scheduler.advance(1.0);
        let ticks: Vec<_> = reports.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_advance_with_hook_runs_before_each_pass() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.set_tick_rate(1.0);
        scheduler.register(ProducerId(0), source(&[("power", 4)]));

        let mut seen = Vec::new();
        let reports = scheduler.advance_with(4.0, |s| {
            seen.push(s.current_tick());
            if s.current_tick() == 2 {
                s.register(ProducerId(1), consumer(&[("power", 4)]));
            }
        });

        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert!(reports[1].outcome(ProducerId(1)).is_none());
        assert!(reports[2].outcome(ProducerId(1)).unwrap().can_produce);
        assert!(reports[3].outcome(ProducerId(1)).unwrap().can_produce);
    }

    #[test]
    fn test_advance_with_no_due_pass_skips_hook() {
        let mut scheduler: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        scheduler.set_tick_rate(1.0);
        let mut calls = 0;
        assert!(scheduler.advance_with(0.5, |_| calls += 1).is_empty());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_status_logging_with_huge_capacity() {
        let config = EngineConfig {
            log_status: true,
            ..EngineConfig::default()
        };
        let huge = i64::MAX / 10;
        let mut scheduler = ProductionScheduler::with_config(&config);
        scheduler.register(ProducerId(0), source(&[("power", huge)]));
        scheduler.register(ProducerId(1), consumer(&[("power", huge)]));

        let report = scheduler.process_production_tick();
        assert_eq!(report.satisfied_count(), 2);
        assert_eq!(report.resource("power").unwrap().utilization_percent(), 100);
    }

    #[test]
    fn test_advance_without_rate_runs_once() {
        let mut scheduler: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        scheduler.set_tick_rate(0.0);
        assert_eq!(scheduler.advance(5.0).len(), 1);
        assert_eq!(scheduler.advance(0.0).len(), 1);
    }

    #[test]
    fn test_clear_all_data() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.set_tick_rate(2.0);
        scheduler.register(ProducerId(0), source(&[("power", 3)]));
        scheduler.advance(1.25);

        scheduler.clear_all_data();

        assert_eq!(scheduler.producer_count(), 0);
        assert_eq!(scheduler.current_tick(), 0);
        assert!(scheduler.ledger().is_empty());
        assert!(scheduler.last_status().is_empty());
        assert_eq!(scheduler.clock().pending_seconds(), 0.0);
        assert!((scheduler.tick_rate() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut scheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), source(&[("power", 10)]));
        scheduler.register(ProducerId(1), consumer(&[("power", 4)]));
        scheduler.process_production_tick();
        scheduler.process_production_tick();

        let bytes = scheduler.snapshot().unwrap();
        let hash = scheduler.state_hash();

        let mut restored: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        restored.restore(&bytes).unwrap();
        assert_eq!(restored.state_hash(), hash);
        assert_eq!(restored.current_tick(), 2);
        assert_eq!(restored.ledger().available("power"), 6);
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let mut scheduler: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        assert!(matches!(
            scheduler.restore(&[1, 2, 3]),
            Err(EngineError::SnapshotDecode(_))
        ));
    }

    #[test]
    fn test_restore_rejects_inconsistent_ledger() {
        use crate::ledger::ResourceInfo;

        let info = |production, available, consumption| ResourceInfo {
            production,
            available,
            consumption,
        };
        // Same layout as an engine snapshot: tick, mode, clock, ledger records.
        let encode = |records: Vec<(&str, ResourceInfo)>| {
            bincode::serialize(&(3u64, AggregationMode::ProducerSum, TickClock::default(), records))
                .unwrap()
        };

        let mut scheduler: ProductionScheduler<StaticProducer> = ProductionScheduler::new();
        let valid = encode(vec![("power", info(10, 6, 4))]);
        scheduler.restore(&valid).unwrap();
        assert_eq!(scheduler.current_tick(), 3);
        let hash = scheduler.state_hash();

        for bytes in [
            encode(vec![("power", info(10, 9, 0))]),
            encode(vec![("power", info(10, -1, 11))]),
            encode(vec![("power", info(4, 4, 0)), ("power", info(4, 4, 0))]),
        ] {
            assert!(matches!(
                scheduler.restore(&bytes),
                Err(EngineError::SnapshotDecode(_))
            ));
            assert_eq!(scheduler.state_hash(), hash);
        }
    }

    #[test]
    fn test_boxed_producers() {
        let mut scheduler: ProductionScheduler = ProductionScheduler::new();
        scheduler.register(ProducerId(0), Box::new(source(&[("power", 1)])));
        scheduler.register(ProducerId(1), Box::new(consumer(&[("power", 1)])));
        let report = scheduler.process_production_tick();
        assert_eq!(report.satisfied_count(), 2);
    }
}
