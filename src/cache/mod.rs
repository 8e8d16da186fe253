//! Cache Module
//!
//! Keyed result storage backing the memo wrappers, with optional LRU
//! bound and expiry.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;
