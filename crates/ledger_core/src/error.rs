//! Error types for the allocation engine.
//!
//! The per-tick allocation pass never fails: scarcity is reported as data.
//! These errors cover the surfaces around it (configuration, snapshots).

use thiserror::Error;

use crate::producer::ProducerId;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for the engine's fallible operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigIo {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Configuration parsed but holds an unusable value.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Engine state could not be encoded.
    #[error("Failed to encode snapshot: {0}")]
    SnapshotEncode(String),

    /// Engine state could not be decoded.
    #[error("Failed to decode snapshot: {0}")]
    SnapshotDecode(String),

    /// An operation referenced a producer that is not registered.
    #[error("Producer not registered: {0}")]
    UnknownProducer(ProducerId),
}
