//! JSON protocol for driving the engine from another process.
//!
//! One JSON object per line in each direction:
//!
//! **Input (stdin):** commands from the host
//! **Output (stdout):** reports and responses
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"register","id":1,"needs":{"power":7}}
//! <- {"type":"ack","cmd":"register"}
//! -> {"cmd":"tick","count":1}
//! <- {"type":"tick","report":{"tick":1,...}}
//! -> {"cmd":"advance","delta":0.5}
//! <- {"type":"tick","report":{"tick":2,...}}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":2,"producers":[1],"resources":[...],"hash":...}
//! ```

use serde::{Deserialize, Serialize};

use ledger_core::capacity::AggregationMode;
use ledger_core::resource::ResourceAmounts;
use ledger_core::scheduler::TickReport;
use ledger_core::status::ResourceStatus;

/// Protocol version announced in the ready line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (host -> runner)
// ============================================================================

/// Commands accepted by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Run N passes regardless of the clock (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Feed elapsed seconds to the tick accumulator.
    Advance { delta: f64 },

    /// Report ledger state without running a pass.
    Query,

    /// Register a producer with fixed needs and production.
    Register {
        id: u64,
        #[serde(default)]
        needs: ResourceAmounts,
        #[serde(default)]
        production: ResourceAmounts,
    },

    /// Remove a producer.
    Unregister { id: u64 },

    /// Report one producer's last result.
    Producer { id: u64 },

    /// Change the tick rate.
    SetTickRate { rate: f64 },

    /// Switch capacity strategy.
    SetMode { mode: AggregationMode },

    /// Drop all producers and ledger state.
    Clear,

    /// State hash for determinism checks.
    Hash,

    /// Stop the runner.
    Quit,
}

impl Command {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Advance { .. } => "advance",
            Self::Query => "query",
            Self::Register { .. } => "register",
            Self::Unregister { .. } => "unregister",
            Self::Producer { .. } => "producer",
            Self::SetTickRate { .. } => "set_tick_rate",
            Self::SetMode { .. } => "set_mode",
            Self::Clear => "clear",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> host)
// ============================================================================

/// Responses written by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// One completed pass.
    Tick { report: TickReport },

    /// Current ledger state.
    State {
        tick: u64,
        producers: Vec<u64>,
        resources: Vec<ResourceStatus>,
        hash: u64,
    },

    /// A producer's most recent result.
    Producer {
        id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_result: Option<bool>,
        coverage: ResourceAmounts,
        ticks_produced: u64,
        ticks_starved: u64,
    },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize as a single JSON line (without the newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {e}"}}"#)
        })
    }
}
