//! Memo Demo - runs the memoization scenarios and timing comparisons
//!
//! Prints a JSON report to stdout; logs go to stderr.

use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_cache::demo::{
    compare, failure_scenario, single_flight_scenario, slow_fib, square_scenario,
};
use memo_cache::models::DemoReport;
use memo_cache::{spawn_cleanup_task, MemoConfig, SharedMemo};

const TIMING_TRIALS: usize = 25;
const SINGLE_FLIGHT_TASKS: usize = 32;

/// Main entry point for the memo demonstration.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Run the memoization scenarios and check their invariants
/// 4. Time memoized vs direct evaluation for an expensive and a cheap function
/// 5. Print the report as JSON
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info,memo_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting memo demo");

    let mut config = MemoConfig::from_env();
    if let Err(err) = config.validate() {
        warn!("{}; falling back to defaults", err);
        config = MemoConfig::default();
    }
    info!(
        "Configuration loaded: max_entries={:?}, max_age={:?}, cleanup_interval={:?}",
        config.max_entries, config.max_age, config.cleanup_interval
    );

    let mut report = DemoReport::new();

    let first = square_scenario("square_repeat", &[3, 3]);
    ensure!(first.evaluations == 1, "repeat call re-evaluated the function");
    report.scenarios.push(first);

    let distinct = square_scenario("square_distinct", &[1, 1, 2, 1, 3, 2]);
    ensure!(
        distinct.evaluations == 3,
        "expected one evaluation per distinct input, got {}",
        distinct.evaluations
    );
    report.scenarios.push(distinct);

    let failure = failure_scenario(2);
    ensure!(failure.evaluations == 2, "a failed evaluation was cached");
    report.scenarios.push(failure);

    let shared = Arc::new(SharedMemo::with_config(&config));
    // Only expiring results need sweeping
    let sweeper = config
        .max_age
        .map(|_| spawn_cleanup_task(Arc::clone(&shared), config.cleanup_interval));

    let single_flight = single_flight_scenario(shared, SINGLE_FLIGHT_TASKS).await;
    ensure!(
        single_flight.evaluations == 1,
        "concurrent callers evaluated the same key {} times",
        single_flight.evaluations
    );
    report.scenarios.push(single_flight);

    if let Some(handle) = sweeper {
        handle.abort();
    }

    // Expensive function, heavy repetition: the cache pays off
    let fib_inputs: Vec<u32> = (0..100).map(|i| 18 + i % 5).collect();
    report.timings.extend(compare(
        "slow_fib",
        &fib_inputs,
        TIMING_TRIALS,
        &config,
        slow_fib,
    ));

    // Cheap function, no repetition: hashing costs more than the work
    let square_inputs: Vec<u32> = (0..10_000).collect();
    report.timings.extend(compare(
        "square",
        &square_inputs,
        TIMING_TRIALS,
        &config,
        |x| u64::from(x) * u64::from(x),
    ));

    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    println!("{}", json);

    info!("Memo demo complete");
    Ok(())
}
