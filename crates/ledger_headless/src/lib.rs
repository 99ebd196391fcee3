//! Headless runner for the allocation engine, for scenario testing and CI
//! verification.
//!
//! The runner drives a [`ProductionScheduler`](ledger_core::scheduler::ProductionScheduler)
//! of fixed-rate producers from JSON commands on stdin, with reports on
//! stdout. This enables:
//!
//! - **Host integration tests**: another process registers producers and
//!   steps the clock without linking the engine
//! - **Scenario replays**: RON scenarios with timed registry changes
//! - **CI verification**: repeated runs must end in the same state hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands (tick, advance, register, unregister, query, ...)
//! - **stdout**: Tick reports and responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":5}' | cargo run -p ledger_headless
//!
//! # Simulate a scenario
//! cargo run -p ledger_headless -- simulate --scenario crates/ledger_headless/scenarios/power_contention.ron --ticks 10
//!
//! # Verify determinism
//! cargo run -p ledger_headless -- verify --runs 5
//! ```

pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod verify;

pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use scenario::{Scenario, ScenarioError};
