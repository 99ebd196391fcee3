//! Scenario loading and configuration.
//!
//! Scenarios define an engine configuration, the initial producers, an
//! optional fixed capacity table and timed registry changes, so a run can
//! be reproduced without a host game.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "power_contention",
//!     description: "Two factories share one plant",
//!     engine: (tick_rate: 20.0),
//!     producers: [
//!         (id: 100, production: {"power": 10}),
//!         (id: 1, needs: {"power": 7}),
//!         (id: 2, needs: {"power": 5}),
//!     ],
//!     events: [
//!         (tick: 3, action: Unregister(2)),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledger_core::capacity::{AggregationMode, StaticCapacitySource};
use ledger_core::config::EngineConfig;
use ledger_core::producer::{ProducerId, StaticProducer};
use ledger_core::resource::ResourceAmounts;
use ledger_core::scheduler::{ProductionScheduler, TickReport};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Engine configuration is unusable.
    #[error("Invalid engine config: {0}")]
    Engine(#[from] ledger_core::error::EngineError),
    /// Two producers share an id.
    #[error("Duplicate producer id {0} in scenario")]
    DuplicateProducer(u64),
}

/// A producer declared by a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerSpec {
    /// Producer id.
    pub id: u64,
    /// Resources needed every tick.
    #[serde(default)]
    pub needs: ResourceAmounts,
    /// Resources contributed every tick.
    #[serde(default)]
    pub production: ResourceAmounts,
}

impl ProducerSpec {
    /// Build the producer this entry describes.
    #[must_use]
    pub fn build(&self) -> StaticProducer {
        StaticProducer::new(self.needs.clone(), self.production.clone())
    }
}

/// A registry or engine change applied between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenarioAction {
    /// Add a producer at the end of the order.
    Register(ProducerSpec),
    /// Remove a producer.
    Unregister(u64),
    /// Change the tick rate.
    SetTickRate(f64),
    /// Switch capacity strategy.
    SetMode(AggregationMode),
}

/// An action scheduled before a given pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    /// Applied once `tick` passes have completed, before the next one.
    pub tick: u64,
    /// What to do.
    pub action: ScenarioAction,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Fixed totals for the external capacity strategy.
    #[serde(default)]
    pub capacity: Option<BTreeMap<String, f64>>,
    /// Producers registered at start, in order.
    #[serde(default)]
    pub producers: Vec<ProducerSpec>,
    /// Timed changes.
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "empty".to_string(),
            description: "No producers".to_string(),
            engine: EngineConfig::default(),
            capacity: None,
            producers: Vec::new(),
            events: Vec::new(),
        }
    }
}

fn spec(id: u64, needs: &[(&str, i64)], production: &[(&str, i64)]) -> ProducerSpec {
    ProducerSpec {
        id,
        needs: needs.iter().map(|&(name, amount)| (name, amount)).collect(),
        production: production.iter().map(|&(name, amount)| (name, amount)).collect(),
    }
}

impl Scenario {
    /// Built-in five-producer chain: a plant feeds a mine, a smelter, a
    /// workshop and housing, and the last two starve.
    #[must_use]
    pub fn production_chain() -> Self {
        Self {
            name: "production_chain".to_string(),
            description: "Plant, mine, smelter, workshop and housing".to_string(),
            engine: EngineConfig::default(),
            capacity: None,
            producers: vec![
                spec(1, &[], &[("power", 20), ("water", 8)]),
                spec(2, &[("power", 5)], &[("ore", 6)]),
                spec(3, &[("power", 8), ("ore", 4), ("water", 3)], &[("steel", 2)]),
                spec(4, &[("steel", 3), ("power", 4)], &[("tools", 1)]),
                spec(5, &[("power", 6), ("water", 6)], &[]),
            ],
            events: Vec::new(),
        }
    }

    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a scenario from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check engine settings and producer ids.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.engine.validate()?;
        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.producers {
            if !seen.insert(spec.id) {
                return Err(ScenarioError::DuplicateProducer(spec.id));
            }
        }
        Ok(())
    }

    /// Build a scheduler with every initial producer registered.
    #[must_use]
    pub fn build(&self) -> ProductionScheduler<StaticProducer> {
        let mut scheduler = ProductionScheduler::with_config(&self.engine);
        if let Some(totals) = &self.capacity {
            scheduler.set_capacity_source(Some(Box::new(StaticCapacitySource::from(
                totals.clone(),
            ))));
        }
        for spec in &self.producers {
            scheduler.register(ProducerId(spec.id), spec.build());
        }
        tracing::debug!(
            scenario = %self.name,
            producers = scheduler.producer_count(),
            "Scenario built"
        );
        scheduler
    }

    /// Apply every event due before the scheduler's next pass.
    pub fn apply_due_events(&self, scheduler: &mut ProductionScheduler<StaticProducer>) {
        let tick = scheduler.current_tick();
        for event in self.events.iter().filter(|e| e.tick == tick) {
            tracing::debug!(tick, action = ?event.action, "Applying scenario event");
            match &event.action {
                ScenarioAction::Register(spec) => {
                    scheduler.register(ProducerId(spec.id), spec.build());
                }
                ScenarioAction::Unregister(id) => {
                    scheduler.unregister(ProducerId(*id));
                }
                ScenarioAction::SetTickRate(rate) => scheduler.set_tick_rate(*rate),
                ScenarioAction::SetMode(mode) => scheduler.set_aggregation_mode(*mode),
            }
        }
    }

    /// Run `ticks` passes, applying events as they fall due, and hand each
    /// report to `on_report`.
    pub fn run<F>(&self, ticks: u64, mut on_report: F) -> ProductionScheduler<StaticProducer>
    where
        F: FnMut(&TickReport),
    {
        let mut scheduler = self.build();
        for _ in 0..ticks {
            self.apply_due_events(&mut scheduler);
            let report = scheduler.process_production_tick();
            on_report(&report);
        }
        scheduler
    }

    /// Final state hash after `ticks` passes.
    #[must_use]
    pub fn final_hash(&self, ticks: u64) -> u64 {
        self.run(ticks, |_| {}).state_hash()
    }
}
