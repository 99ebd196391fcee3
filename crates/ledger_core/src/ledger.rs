//! The resource ledger.
//!
//! Holds, for every known resource, the tick's production capacity, the
//! remaining available balance, and the amount consumed so far this tick.
//! The ledger is the single arbiter that prevents over-allocation: the only
//! way to take from it is [`Ledger::consume`], which refuses any request
//! that would drive a balance negative.
//!
//! # Invariants
//!
//! Within a tick, once consumption begins:
//! - `available + consumption == production`
//! - `available >= 0`
//!
//! The ledger performs no locking. It is owned and mutated by a single
//! scheduler pass; everything else gets `&Ledger`.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::resource::{ResourceId, ResourceName};
use crate::status::ResourceStatus;

/// Read-only view of one resource's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Capacity installed for this tick.
    pub production: i64,
    /// Remaining balance this tick.
    pub available: i64,
    /// Amount taken so far this tick.
    pub consumption: i64,
}

impl ResourceInfo {
    /// Counters that a sequence of ledger operations can produce: nothing
    /// negative, and `available + consumption` equal to the installed
    /// capacity (or to the consumption, if capacity was lowered below it
    /// mid-tick).
    fn is_balanced(&self) -> bool {
        self.production >= 0
            && self.available >= 0
            && self.consumption >= 0
            && self.available.checked_add(self.consumption)
                == Some(self.production.max(self.consumption))
    }
}

/// Stored record of a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResourceRecord {
    name: ResourceName,
    info: ResourceInfo,
}

impl ResourceRecord {
    fn new(name: ResourceName) -> Self {
        Self {
            name,
            info: ResourceInfo::default(),
        }
    }

    /// Install a new capacity and rebase the balance against what has
    /// already been consumed this tick.
    fn install_capacity(&mut self, production: i64) {
        self.info.production = production.max(0);
        self.info.available = (self.info.production - self.info.consumption).max(0);
    }
}

/// Per-resource production/available/consumption ledger.
///
/// Records are created on first reference and never destroyed; iteration
/// follows creation order so every pass over the ledger is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<ResourceRecord>,
    index: HashMap<ResourceName, ResourceId>,
}

// Only the records are persisted; the name index is rebuilt on load, and
// records that break the ledger invariants are rejected.
impl Serialize for Ledger {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let records = Vec::<ResourceRecord>::deserialize(deserializer)?;
        let mut index = HashMap::with_capacity(records.len());
        for (slot, record) in records.iter().enumerate() {
            if !record.info.is_balanced() {
                return Err(D::Error::custom(format!(
                    "resource {} is out of balance: {:?}",
                    record.name, record.info
                )));
            }
            if index
                .insert(record.name.clone(), ResourceId(slot as u32))
                .is_some()
            {
                return Err(D::Error::custom(format!("duplicate resource {}", record.name)));
            }
        }
        Ok(Self { records, index })
    }
}

impl PartialEq for Ledger {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for Ledger {}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zeroed record for `name` if none exists and return its handle.
    ///
    /// Idempotent.
    pub fn ensure_exists(&mut self, name: &str) -> ResourceId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = ResourceId(self.records.len() as u32);
        let name = ResourceName::from(name);
        self.records.push(ResourceRecord::new(name.clone()));
        self.index.insert(name, id);
        tracing::trace!(resource = %self.records[id.index()].name, slot = id.0, "Resource created");
        id
    }

    /// Open a new tick: every balance returns to its installed capacity and
    /// consumption clears.
    pub fn reset_tick(&mut self) {
        for record in &mut self.records {
            record.info.available = record.info.production;
            record.info.consumption = 0;
        }
    }

    /// Overwrite a resource's capacity.
    ///
    /// The new capacity is visible immediately: `available` becomes the new
    /// capacity minus whatever was already consumed this tick. Negative
    /// capacities are installed as zero.
    pub fn set_production(&mut self, name: &str, amount: i64) {
        let id = self.ensure_exists(name);
        self.records[id.index()].install_capacity(amount);
        self.validate(id);
    }

    /// Add to a resource's capacity, for contributions folded in one at a time.
    pub fn add_production(&mut self, name: &str, amount: i64) {
        let id = self.ensure_exists(name);
        let record = &mut self.records[id.index()];
        let production = record.info.production.saturating_add(amount);
        record.install_capacity(production);
        self.validate(id);
    }

    /// Current balance of a resource, or 0 if it has never been referenced.
    #[must_use]
    pub fn available(&self, name: &str) -> i64 {
        self.index
            .get(name)
            .map_or(0, |id| self.records[id.index()].info.available)
    }

    /// Take `amount` of a resource.
    ///
    /// Succeeds only if the full amount is available; otherwise nothing
    /// changes and `false` is returned. Negative amounts are refused.
    pub fn consume(&mut self, name: &str, amount: i64) -> bool {
        if amount < 0 {
            tracing::warn!(resource = name, amount, "Refusing negative consumption");
            return false;
        }
        let Some(&id) = self.index.get(name) else {
            // Unknown resources have nothing available.
            return amount == 0;
        };
        let info = &mut self.records[id.index()].info;
        if info.available < amount {
            return false;
        }
        info.available -= amount;
        info.consumption += amount;
        self.validate(id);
        true
    }

    /// Snapshot of a resource's counters.
    #[must_use]
    pub fn resource_info(&self, name: &str) -> Option<ResourceInfo> {
        self.index.get(name).map(|id| self.records[id.index()].info)
    }

    /// Look up the handle of a known resource.
    #[must_use]
    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.index.get(name).copied()
    }

    /// Name of the resource behind a handle.
    #[must_use]
    pub fn name(&self, id: ResourceId) -> Option<&ResourceName> {
        self.records.get(id.index()).map(|record| &record.name)
    }

    /// Iterate resources in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, ResourceInfo)> {
        self.records.iter().map(|record| (&record.name, record.info))
    }

    /// Names of every known resource, in creation order.
    pub fn names(&self) -> impl Iterator<Item = &ResourceName> {
        self.records.iter().map(|record| &record.name)
    }

    /// Number of known resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no resource has been referenced yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Status of every resource, in creation order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ResourceStatus> {
        self.records
            .iter()
            .map(|record| ResourceStatus::new(record.name.clone(), record.info))
            .collect()
    }

    /// Deterministic hash of every record in creation order.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.records.len().hash(&mut hasher);
        for record in &self.records {
            record.name.hash(&mut hasher);
            record.info.production.hash(&mut hasher);
            record.info.available.hash(&mut hasher);
            record.info.consumption.hash(&mut hasher);
        }
        hasher.finish()
    }

    #[cfg(feature = "debug-validation")]
    fn validate(&self, id: ResourceId) {
        let record = &self.records[id.index()];
        assert!(
            record.info.is_balanced(),
            "ledger out of balance for {}: {:?}",
            record.name,
            record.info
        );
    }

    #[cfg(not(feature = "debug-validation"))]
    #[allow(clippy::unused_self)]
    fn validate(&self, _id: ResourceId) {}
}
