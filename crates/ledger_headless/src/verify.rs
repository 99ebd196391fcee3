//! Determinism verification and throughput measurement for scenarios.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::scenario::Scenario;

/// Final hashes from repeated runs of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Scenario name.
    pub scenario: String,
    /// Passes per run.
    pub ticks: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
}

impl VerifyOutcome {
    /// True if every run ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|pair| pair[0] == pair[1])
    }
}

/// Run `scenario` `runs` times for `ticks` passes each and collect the final
/// state hashes.
#[must_use]
pub fn verify_determinism(scenario: &Scenario, ticks: u64, runs: u32) -> VerifyOutcome {
    let hashes = (0..runs)
        .map(|run| {
            let hash = scenario.final_hash(ticks);
            tracing::debug!(run, hash, "Verification run complete");
            hash
        })
        .collect();
    VerifyOutcome {
        scenario: scenario.name.clone(),
        ticks,
        hashes,
    }
}

/// Timing of a benchmark run.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkResult {
    /// Passes executed.
    pub ticks: u64,
    /// Producers registered at the end.
    pub producers: usize,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl BenchmarkResult {
    /// Passes per wall-clock second.
    #[must_use]
    pub fn ticks_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 / secs
        } else {
            f64::INFINITY
        }
    }

    /// Mean wall-clock time per pass in microseconds.
    #[must_use]
    pub fn micros_per_tick(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1_000_000.0 / self.ticks as f64
    }
}

/// Time `ticks` passes of `scenario`.
#[must_use]
pub fn benchmark(scenario: &Scenario, ticks: u64) -> BenchmarkResult {
    let start = Instant::now();
    let scheduler = scenario.run(ticks, |_| {});
    BenchmarkResult {
        ticks,
        producers: scheduler.producer_count(),
        elapsed: start.elapsed(),
    }
}
