//! Background Tasks Module
//!
//! Contains background tasks that maintain shared memo caches.
//!
//! # Tasks
//! - Expiry Cleanup: Removes results older than `max_age` at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
