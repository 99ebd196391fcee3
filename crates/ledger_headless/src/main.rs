//! Headless allocation engine runner.
//!
//! Runs the engine without a host game, controlled via JSON on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p ledger_headless
//!
//! # Interactive mode with a preloaded scenario
//! cargo run -p ledger_headless -- run --scenario scenarios/power_contention.ron
//!
//! # Print one JSON report per pass
//! cargo run -p ledger_headless -- simulate --ticks 100
//!
//! # Check that repeated runs agree
//! cargo run -p ledger_headless -- verify --runs 5 --ticks 1000
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ledger_headless::{
    protocol::Response,
    runner::HeadlessRunner,
    scenario::{Scenario, ScenarioError},
    verify::{benchmark, verify_determinism},
};

#[derive(Parser)]
#[command(name = "ledger_headless")]
#[command(about = "Headless allocation engine runner for scenario testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON protocol on stdin/stdout
    Run {
        /// Scenario file to preload
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },

    /// Run a scenario and print one report per pass
    Simulate {
        /// Scenario file (defaults to the built-in production chain)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of passes
        #[arg(short, long, default_value = "10")]
        ticks: u64,
    },

    /// Run a scenario several times and compare final state hashes
    Verify {
        /// Scenario file (defaults to the built-in production chain)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Passes per run
        #[arg(short, long, default_value = "1000")]
        ticks: u64,

        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },

    /// Measure allocation throughput
    Benchmark {
        /// Scenario file (defaults to the built-in production chain)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of passes
        #[arg(short, long, default_value = "100000")]
        ticks: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Run { scenario }) => cmd_run(scenario),
        Some(Commands::Simulate { scenario, ticks }) => cmd_simulate(scenario, ticks),
        Some(Commands::Verify {
            scenario,
            ticks,
            runs,
        }) => cmd_verify(scenario, ticks, runs),
        Some(Commands::Benchmark { scenario, ticks }) => cmd_benchmark(scenario, ticks),
        None => cmd_run(None),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn load_or_default(path: Option<PathBuf>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => {
            tracing::info!("Using scenario: {}", path.display());
            Scenario::load(path)
        }
        None => Ok(Scenario::production_chain()),
    }
}

/// Serve the protocol until `quit` or end of input.
fn cmd_run(scenario: Option<PathBuf>) -> Result<ExitCode, CliError> {
    tracing::info!("Starting interactive session");

    let mut runner = match scenario {
        Some(path) => HeadlessRunner::with_scenario(Scenario::load(path)?),
        None => HeadlessRunner::new(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    runner.run(stdin.lock(), &mut stdout)?;
    Ok(ExitCode::SUCCESS)
}

/// Print a tick response per pass, then the final state hash.
fn cmd_simulate(scenario: Option<PathBuf>, ticks: u64) -> Result<ExitCode, CliError> {
    let scenario = load_or_default(scenario)?;
    tracing::info!(scenario = %scenario.name, ticks, "Simulating");

    let mut stdout = io::stdout().lock();
    let mut write_error = None;
    let scheduler = scenario.run(ticks, |report| {
        if write_error.is_some() {
            return;
        }
        let line = Response::Tick {
            report: report.clone(),
        }
        .to_json_line();
        if let Err(e) = writeln!(stdout, "{line}") {
            write_error = Some(e);
        }
    });
    if let Some(e) = write_error {
        return Err(e.into());
    }

    let summary = Response::StateHash {
        tick: scheduler.current_tick(),
        hash: scheduler.state_hash(),
    };
    writeln!(stdout, "{}", summary.to_json_line())?;
    Ok(ExitCode::SUCCESS)
}

/// Compare final hashes across repeated runs.
fn cmd_verify(scenario: Option<PathBuf>, ticks: u64, runs: u32) -> Result<ExitCode, CliError> {
    let scenario = load_or_default(scenario)?;
    tracing::info!(
        "Verifying determinism: {} for {} ticks ({} runs)",
        scenario.name,
        ticks,
        runs
    );

    let outcome = verify_determinism(&scenario, ticks, runs);
    if outcome.is_deterministic() {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected! Hashes: {:?}", outcome.hashes);
        Ok(ExitCode::FAILURE)
    }
}

/// Report throughput for a scenario.
fn cmd_benchmark(scenario: Option<PathBuf>, ticks: u64) -> Result<ExitCode, CliError> {
    let scenario = load_or_default(scenario)?;
    tracing::info!("Running {} tick benchmark", ticks);

    let result = benchmark(&scenario, ticks);

    eprintln!("Benchmark results:");
    eprintln!("  Scenario: {}", scenario.name);
    eprintln!("  Producers: {}", result.producers);
    eprintln!("  Ticks: {}", result.ticks);
    eprintln!("  Elapsed: {:.3}s", result.elapsed.as_secs_f64());
    eprintln!("  Ticks/sec: {:.0}", result.ticks_per_second());
    eprintln!("  Per tick: {:.2}us", result.micros_per_tick());
    Ok(ExitCode::SUCCESS)
}
