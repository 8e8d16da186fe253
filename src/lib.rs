//! Memo Cache - memoizing function wrappers
//!
//! Caches the results of pure functions keyed by input, with optional LRU
//! bound, result expiry, and a single-flight variant for concurrent use.

pub mod cache;
pub mod config;
pub mod demo;
pub mod error;
pub mod memo;
pub mod models;
pub mod tasks;
pub mod timing;

pub use cache::CacheStats;
pub use config::MemoConfig;
pub use error::{ConfigError, MemoError};
pub use memo::{forget, memoize, Memoized, SharedMemo};
pub use tasks::spawn_cleanup_task;
