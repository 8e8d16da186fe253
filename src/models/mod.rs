//! Report models for the demonstration binary
//!
//! Serializable DTOs describing scenario outcomes and timings.

pub mod report;

// Re-export commonly used types
pub use report::{DemoReport, ScenarioReport, TimingReport};
