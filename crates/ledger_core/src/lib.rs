//! # Ledger Core
//!
//! Deterministic, tick-driven production and resource-allocation engine.
//!
//! Once per tick the engine establishes how much of each named resource
//! exists, lets every registered producer declare what it needs and what it
//! contributes, admits each producer all-or-nothing against the shared pool
//! in registration order, commits the consumption, and tells every producer
//! whether it may produce.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond loading a config file
//! - No randomness
//! - No threads: a pass is one synchronous unit of work
//!
//! ## Crate Structure
//!
//! - [`resource`] - Resource names, handles and ordered amount maps
//! - [`ledger`] - Per-resource production/available/consumption counters
//! - [`producer`] - The producer contract and simple adapters
//! - [`capacity`] - Aggregation strategies (producer sum, external totals)
//! - [`scheduler`] - Producer registry and the allocation pass
//! - [`clock`] - Converts frame deltas into whole ticks
//! - [`status`] - Status publication and stock-inclusive balances
//! - [`config`] - RON engine configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod capacity;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod math;
pub mod producer;
pub mod resource;
pub mod scheduler;
pub mod status;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::capacity::{AggregationMode, CapacitySource, StaticCapacitySource};
    pub use crate::clock::TickClock;
    pub use crate::config::EngineConfig;
    pub use crate::error::{EngineError, Result};
    pub use crate::ledger::{Ledger, ResourceInfo};
    pub use crate::producer::{Producer, ProducerId, StaticProducer};
    pub use crate::resource::{ResourceAmounts, ResourceId, ResourceName};
    pub use crate::scheduler::{ProducerOutcome, ProductionScheduler, TickReport};
    pub use crate::status::{total_balance, ResourceStatus, StockHolder};
}
