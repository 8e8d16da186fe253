//! Timing Harness
//!
//! Runs a candidate function over repeated trials and summarizes elapsed
//! time, for side-by-side comparisons of two implementations of the same
//! operation.

use std::hint::black_box;
use std::time::{Duration, Instant};

use serde::Serialize;

// == Timing Summary ==
/// Elapsed-time statistics over a set of trials, in microseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub trials: usize,
    pub min_us: f64,
    pub median_us: f64,
    pub mean_us: f64,
    pub max_us: f64,
}

impl TimingSummary {
    /// Summarizes raw trial durations. Returns None for an empty sample.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = samples
            .iter()
            .map(|d| d.as_nanos() as f64 / 1_000.0)
            .collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self {
            trials: n,
            min_us: sorted[0],
            median_us: median,
            mean_us: sorted.iter().sum::<f64>() / n as f64,
            max_us: sorted[n - 1],
        })
    }
}

// == Time Trials ==
/// Runs `f` `trials` times and summarizes the elapsed time of each run.
///
/// Results are passed through [`black_box`] so the optimizer cannot drop
/// the work. Returns None when `trials` is zero.
pub fn time_trials<T>(trials: usize, mut f: impl FnMut() -> T) -> Option<TimingSummary> {
    let samples: Vec<Duration> = (0..trials)
        .map(|_| {
            let start = Instant::now();
            black_box(f());
            start.elapsed()
        })
        .collect();

    TimingSummary::from_samples(&samples)
}
