//! Demonstration Scenarios
//!
//! Small, self-contained runs of the memo wrappers used by the `memo_demo`
//! binary and the integration tests.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::MemoConfig;
use crate::memo::{memoize, Memoized, SharedMemo};
use crate::models::{ScenarioReport, TimingReport};
use crate::timing::time_trials;

/// Naive recursive Fibonacci, deliberately expensive
pub fn slow_fib(n: u32) -> u64 {
    if n < 2 {
        u64::from(n)
    } else {
        slow_fib(n - 1) + slow_fib(n - 2)
    }
}

/// Runs `inputs` through a counted `x * x` wrapper.
pub fn square_scenario(name: &str, inputs: &[i64]) -> ScenarioReport {
    let evaluations = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&evaluations);
    let mut memo = memoize(move |x: &i64| {
        counter.set(counter.get() + 1);
        x * x
    });

    for &x in inputs {
        let squared = memo.call(x);
        debug_assert_eq!(squared, x * x);
    }

    info!(
        "Scenario {}: {} calls, {} evaluations",
        name,
        inputs.len(),
        evaluations.get()
    );
    ScenarioReport::new(name, inputs.len(), evaluations.get(), memo.stats())
}

/// Calls a function that fails on negative input `repeats` times with -1.
pub fn failure_scenario(repeats: usize) -> ScenarioReport {
    let evaluations = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&evaluations);
    let mut memo = memoize(move |x: &i64| {
        counter.set(counter.get() + 1);
        if *x < 0 {
            Err(format!("cannot take the square root of {}", x))
        } else {
            Ok((*x as f64).sqrt())
        }
    });

    for _ in 0..repeats {
        if let Err(err) = memo.try_call(-1) {
            info!("Failure scenario: {}", err);
        }
    }

    ScenarioReport::new("failure", repeats, evaluations.get(), memo.stats())
}

/// Fires `tasks` concurrent requests for one key at a shared memo.
pub async fn single_flight_scenario(
    memo: Arc<SharedMemo<u32, u64>>,
    tasks: usize,
) -> ScenarioReport {
    let evaluations = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let memo = Arc::clone(&memo);
            let evaluations = Arc::clone(&evaluations);
            tokio::spawn(async move {
                memo.get_or_compute(27u32, |n| {
                    evaluations.fetch_add(1, Ordering::SeqCst);
                    let n = *n;
                    async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        slow_fib(n)
                    }
                })
                .await
            })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        if handle.await.is_ok() {
            completed += 1;
        }
    }

    let evaluations = evaluations.load(Ordering::SeqCst);
    info!(
        "Single-flight scenario: {} tasks completed, {} evaluations",
        completed, evaluations
    );
    ScenarioReport::new("single_flight", tasks, evaluations, memo.stats().await)
}

/// Compares memoized and direct evaluation over a repetitive input stream.
///
/// A fresh wrapper is built for every trial, so the gain measured is the
/// one from repetition within the stream.
pub fn compare<F>(
    name: &str,
    inputs: &[u32],
    trials: usize,
    config: &MemoConfig,
    f: F,
) -> Option<TimingReport>
where
    F: Fn(u32) -> u64 + Copy,
{
    let direct = time_trials(trials, || inputs.iter().map(|&x| f(x)).sum::<u64>())?;
    let memoized = time_trials(trials, || {
        let mut memo = Memoized::with_config(|x: &u32| f(*x), config);
        inputs.iter().map(|&x| memo.call(x)).sum::<u64>()
    })?;

    let report = TimingReport::new(name, direct, memoized);
    info!(
        "Timing {}: direct median {:.1}us, memoized median {:.1}us, speedup {:.2}x",
        name, report.direct.median_us, report.memoized.median_us, report.speedup
    );
    Some(report)
}
