//! The producer contract.
//!
//! Every participant in the allocation pass implements [`Producer`]: it
//! reports what it needs and what it contributes for the current tick, and
//! is told whether it may produce. Needs and production are recomputed by
//! the producer every tick; the engine never caches them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::ResourceAmounts;

/// Caller-chosen identity of a registered producer (usually an entity id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub u64);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Capability implemented by anything that takes part in production.
pub trait Producer {
    /// Resources required this tick, in the order they should be checked.
    fn resource_needs(&self) -> ResourceAmounts;

    /// Resources contributed to the shared pool this tick.
    fn resource_production(&self) -> ResourceAmounts;

    /// Admission result for this tick. `true` means every need was met and
    /// has been deducted from the ledger.
    fn on_production_tick(&mut self, can_produce: bool);

    /// How much of each checked need was available, for display only.
    ///
    /// Called before [`on_production_tick`](Self::on_production_tick).
    fn set_needs_coverage(&mut self, _coverage: &ResourceAmounts) {}
}

impl<P: Producer + ?Sized> Producer for Box<P> {
    fn resource_needs(&self) -> ResourceAmounts {
        (**self).resource_needs()
    }

    fn resource_production(&self) -> ResourceAmounts {
        (**self).resource_production()
    }

    fn on_production_tick(&mut self, can_produce: bool) {
        (**self).on_production_tick(can_produce);
    }

    fn set_needs_coverage(&mut self, coverage: &ResourceAmounts) {
        (**self).set_needs_coverage(coverage);
    }
}

/// Producer with constant needs and production.
///
/// Remembers the last admission result and coverage report, and counts how
/// many ticks it was allowed or refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticProducer {
    /// Resources required every tick.
    pub needs: ResourceAmounts,
    /// Resources contributed every tick.
    pub production: ResourceAmounts,
    /// Result of the most recent tick, `None` before the first.
    #[serde(default)]
    pub last_result: Option<bool>,
    /// Coverage report of the most recent tick.
    #[serde(default)]
    pub last_coverage: ResourceAmounts,
    /// Ticks on which production was allowed.
    #[serde(default)]
    pub ticks_produced: u64,
    /// Ticks on which production was refused.
    #[serde(default)]
    pub ticks_starved: u64,
}

impl StaticProducer {
    /// Create a producer with the given needs and production.
    #[must_use]
    pub fn new(needs: ResourceAmounts, production: ResourceAmounts) -> Self {
        Self {
            needs,
            production,
            ..Self::default()
        }
    }

    /// A producer that only consumes.
    #[must_use]
    pub fn consumer(needs: ResourceAmounts) -> Self {
        Self::new(needs, ResourceAmounts::new())
    }

    /// A producer that only contributes.
    #[must_use]
    pub fn source(production: ResourceAmounts) -> Self {
        Self::new(ResourceAmounts::new(), production)
    }
}

impl Producer for StaticProducer {
    fn resource_needs(&self) -> ResourceAmounts {
        self.needs.clone()
    }

    fn resource_production(&self) -> ResourceAmounts {
        self.production.clone()
    }

    fn on_production_tick(&mut self, can_produce: bool) {
        self.last_result = Some(can_produce);
        if can_produce {
            self.ticks_produced += 1;
        } else {
            self.ticks_starved += 1;
        }
    }

    fn set_needs_coverage(&mut self, coverage: &ResourceAmounts) {
        self.last_coverage.clone_from(coverage);
    }
}
