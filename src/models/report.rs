//! Report DTOs
//!
//! Defines the JSON document the demonstration binary prints.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::timing::TimingSummary;

/// Outcome of one memoization scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Short scenario name
    pub name: String,
    /// Number of calls made through the wrapper
    pub calls: usize,
    /// Number of times the wrapped function actually ran
    pub evaluations: usize,
    /// Cache statistics after the scenario
    pub stats: CacheStats,
}

impl ScenarioReport {
    pub fn new(
        name: impl Into<String>,
        calls: usize,
        evaluations: usize,
        stats: CacheStats,
    ) -> Self {
        Self {
            name: name.into(),
            calls,
            evaluations,
            stats,
        }
    }
}

/// Memoized vs direct timing of the same workload
#[derive(Debug, Clone, Serialize)]
pub struct TimingReport {
    /// Workload name
    pub name: String,
    pub direct: TimingSummary,
    pub memoized: TimingSummary,
    /// direct median / memoized median; below 1.0 the cache is a net loss
    pub speedup: f64,
}

impl TimingReport {
    pub fn new(name: impl Into<String>, direct: TimingSummary, memoized: TimingSummary) -> Self {
        let speedup = if memoized.median_us > 0.0 {
            direct.median_us / memoized.median_us
        } else {
            0.0
        };
        Self {
            name: name.into(),
            direct,
            memoized,
            speedup,
        }
    }
}

/// Full output of a demonstration run
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    /// Report creation time in RFC 3339 format
    pub generated_at: String,
    pub scenarios: Vec<ScenarioReport>,
    pub timings: Vec<TimingReport>,
}

impl DemoReport {
    /// Creates an empty report stamped with the current time
    pub fn new() -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            scenarios: Vec::new(),
            timings: Vec::new(),
        }
    }
}

impl Default for DemoReport {
    fn default() -> Self {
        Self::new()
    }
}
