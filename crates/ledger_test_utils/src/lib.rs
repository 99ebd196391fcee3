//! # Ledger Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Recording producer doubles
//! - Fixture builders
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod producers;

/// Re-export proptest for convenience.
pub use proptest;
