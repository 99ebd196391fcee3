//! Capacity strategies for the aggregation phase.
//!
//! Each tick the scheduler installs one capacity figure per resource before
//! any admission check runs. The figures come from one of two strategies,
//! chosen once per tick by [`AggregationMode`]:
//!
//! - [`AggregationMode::ProducerSum`] sums every registered producer's
//!   declared production.
//! - [`AggregationMode::ExternalTotals`] takes totals from a pluggable
//!   [`CapacitySource`], keyed `"<resource>_production"`.
//!
//! Either way the result is a [`ResourceAmounts`] table handed to
//! [`install_capacity`], so the admission phase never knows which strategy
//! produced it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::producer::Producer;
use crate::resource::ResourceAmounts;

/// Key suffix marking a production total in a [`CapacitySource`] table.
pub const PRODUCTION_SUFFIX: &str = "_production";

/// Where the tick's capacity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregationMode {
    /// Sum of every registered producer's declared production.
    #[default]
    ProducerSum,
    /// Totals reported by an external [`CapacitySource`].
    ExternalTotals,
}

/// Provider of aggregate totals, used in [`AggregationMode::ExternalTotals`].
pub trait CapacitySource {
    /// Current totals keyed by well-known names such as `"power_production"`.
    fn totals(&self) -> BTreeMap<String, f64>;
}

impl<C: CapacitySource + ?Sized> CapacitySource for Box<C> {
    fn totals(&self) -> BTreeMap<String, f64> {
        (**self).totals()
    }
}

/// A fixed totals table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCapacitySource {
    totals: BTreeMap<String, f64>,
}

impl StaticCapacitySource {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the production total for a resource.
    pub fn set_production(&mut self, resource: &str, amount: f64) {
        self.totals
            .insert(format!("{resource}{PRODUCTION_SUFFIX}"), amount);
    }

    /// Builder form of [`set_production`](Self::set_production).
    #[must_use]
    pub fn with_production(mut self, resource: &str, amount: f64) -> Self {
        self.set_production(resource, amount);
        self
    }
}

impl From<BTreeMap<String, f64>> for StaticCapacitySource {
    fn from(totals: BTreeMap<String, f64>) -> Self {
        Self { totals }
    }
}

impl CapacitySource for StaticCapacitySource {
    fn totals(&self) -> BTreeMap<String, f64> {
        self.totals.clone()
    }
}

/// Sum declared production across producers, in producer order.
pub fn aggregate_production<'a, P, I>(producers: I) -> ResourceAmounts
where
    P: Producer + ?Sized + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let mut totals = ResourceAmounts::new();
    for producer in producers {
        for (name, amount) in &producer.resource_production() {
            totals.add(name.clone(), amount);
        }
    }
    totals
}

/// Extract per-resource capacity from an external totals table.
///
/// Only `"<resource>_production"` keys are used. Values are truncated
/// toward zero; non-finite values read as zero.
#[must_use]
pub fn external_production(totals: &BTreeMap<String, f64>) -> ResourceAmounts {
    totals
        .iter()
        .filter_map(|(key, value)| {
            let resource = key.strip_suffix(PRODUCTION_SUFFIX)?;
            if resource.is_empty() {
                return None;
            }
            let amount = if value.is_finite() { value.trunc() as i64 } else { 0 };
            Some((resource, amount))
        })
        .collect()
}

/// Install a capacity table into the ledger.
///
/// Every resource in `totals` gets its total; every other known resource is
/// installed at zero, so capacity never lingers from an earlier tick.
pub fn install_capacity(ledger: &mut Ledger, totals: &ResourceAmounts) {
    for (name, amount) in totals {
        ledger.set_production(name.as_str(), amount);
    }
    let untouched: Vec<_> = ledger
        .names()
        .filter(|name| !totals.contains(name.as_str()))
        .cloned()
        .collect();
    for name in untouched {
        ledger.set_production(name.as_str(), 0);
    }
}
