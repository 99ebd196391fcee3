//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the allocation engine produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! The engine must be replayable for save/load and testing. Sources of
//! non-determinism it guards against include:
//!
//! - **Float drift in the tick clock**: pending time is fixed-point, see
//!   [`ledger_core::math`].
//!
//! - **HashMap iteration order**: the ledger iterates in resource creation
//!   order and producers are visited in registration order; neither depends
//!   on a hasher.
//!
//! - **Hidden caching**: producers are asked for their needs and production
//!   on every pass.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: ledger, clock and admission rules
//! 2. **Property tests**: random producer sets still produce identical hashes
//! 3. **Integration tests**: full scenarios are reproducible
//! 4. **Parallel tests**: running N schedulers on separate threads all match

use std::thread;

use ledger_core::producer::Producer;
use ledger_core::scheduler::ProductionScheduler;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Allocation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a scheduler setup twice for `num_ticks` passes and compare hashes.
pub fn verify_scheduler_determinism<P, F>(setup_fn: F, num_ticks: u64) -> bool
where
    P: Producer,
    F: Fn() -> ProductionScheduler<P>,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |scheduler| {
            scheduler.process_production_tick();
        },
        |scheduler| scheduler.state_hash(),
    );
    result.is_deterministic
}

/// Result of parallel scheduler runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks each run processed.
    pub ticks: u64,
    /// Number of runs.
    pub num_runs: usize,
}

impl ParallelRunResult {
    /// Check if all runs produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all runs matched.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel runs diverged!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_runs,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N independent schedulers on scoped threads and collect final hashes.
///
/// Each scheduler is built and driven entirely on its own thread.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_schedulers<P, F>(setup_fn: F, num_runs: usize, num_ticks: u64) -> ParallelRunResult
where
    P: Producer,
    F: Fn() -> ProductionScheduler<P> + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut scheduler = setup_fn();
                    for _ in 0..num_ticks {
                        scheduler.process_production_tick();
                    }
                    scheduler.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    tracing::debug!(runs = num_runs, ticks = num_ticks, ?hashes, "Parallel scheduler runs finished");

    ParallelRunResult {
        hashes,
        ticks: num_ticks,
        num_runs,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(tick)` for the first pass
/// after which their hashes differ (0 means the initial state).
pub fn find_first_divergence<P, F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    P: Producer,
    F: Fn() -> ProductionScheduler<P>,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.process_production_tick();
        b.process_production_tick();

        if a.state_hash() != b.state_hash() {
            tracing::warn!(tick, "Scheduler runs diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot/restore round-trip preserves engine state exactly
/// and that both copies keep evolving identically afterwards.
pub fn verify_snapshot_determinism<P, F>(setup_fn: F, num_ticks: u64) -> bool
where
    P: Producer,
    F: Fn() -> ProductionScheduler<P>,
{
    let mut original = setup_fn();
    for _ in 0..num_ticks {
        original.process_production_tick();
    }

    let Ok(bytes) = original.snapshot() else {
        return false;
    };

    // Same producers, restored engine state.
    let mut restored = setup_fn();
    if restored.restore(&bytes).is_err() {
        return false;
    }
    if restored.state_hash() != original.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        original.process_production_tick();
        restored.process_production_tick();
    }
    restored.state_hash() == original.state_hash()
}

/// Proptest strategies for allocation testing.
///
/// These strategies generate random but reproducible producer sets and
/// time deltas.
pub mod strategies {
    use proptest::prelude::*;

    use ledger_core::producer::StaticProducer;
    use ledger_core::resource::ResourceAmounts;

    /// Resource names the strategies draw from.
    pub const RESOURCE_NAMES: [&str; 4] = ["power", "water", "ore", "steel"];

    /// Generate one of [`RESOURCE_NAMES`].
    pub fn arb_resource_name() -> impl Strategy<Value = &'static str> {
        prop::sample::select(RESOURCE_NAMES.to_vec())
    }

    /// Generate an amount map with up to `max_entries` entries (0-50 each).
    pub fn arb_amounts(max_entries: usize) -> impl Strategy<Value = ResourceAmounts> {
        proptest::collection::vec((arb_resource_name(), 0i64..50), 0..=max_entries)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    /// Generate a static producer with random needs and production.
    pub fn arb_producer() -> impl Strategy<Value = StaticProducer> {
        (arb_amounts(3), arb_amounts(2))
            .prop_map(|(needs, production)| StaticProducer::new(needs, production))
    }

    /// Generate a list of producers.
    pub fn arb_producer_set(max_producers: usize) -> impl Strategy<Value = Vec<StaticProducer>> {
        proptest::collection::vec(arb_producer(), 1..max_producers)
    }

    /// Generate a whole-millisecond time delta (0-10 s).
    pub fn arb_delta_ms() -> impl Strategy<Value = u32> {
        0u32..10_000
    }

    /// Generate a whole-number tick rate (1-120 per second).
    pub fn arb_tick_rate() -> impl Strategy<Value = u32> {
        1u32..=120
    }
}
