//! Expiry Cleanup Task
//!
//! Background task that periodically removes expired results from a
//! shared memo cache.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::memo::SharedMemo;

/// Spawns a background task that periodically sweeps expired results.
///
/// Expired results are already ignored on lookup; the sweep releases their
/// memory when the keys are never requested again.
///
/// # Arguments
/// * `memo` - Shared memo cache to sweep
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which the owner aborts on shutdown.
///
/// # Example
/// ```ignore
/// let memo = Arc::new(SharedMemo::with_config(&config));
/// let cleanup_handle = spawn_cleanup_task(memo.clone(), config.cleanup_interval);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<K, V>(memo: Arc<SharedMemo<K, V>>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting memo expiry cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = memo.cleanup_expired().await;

            if removed > 0 {
                info!("Memo cleanup: removed {} expired results", removed);
            } else {
                debug!("Memo cleanup: no expired results found");
            }
        }
    })
}
