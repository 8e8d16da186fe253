//! Thread-safe memo cache with per-key single-flight evaluation.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::config::MemoConfig;
use crate::error::{MemoError, Result};

/// Result slot for one key. Uninitialized while the first evaluation runs.
type Slot<V> = Arc<OnceCell<CacheEntry<V>>>;

#[derive(Debug)]
struct SharedState<K, V> {
    slots: HashMap<K, Slot<V>>,
    lru: LruTracker<K>,
    stats: CacheStats,
}

impl<K, V> SharedState<K, V>
where
    K: Eq + Hash + Clone,
{
    fn discard(&mut self, key: &K) -> bool {
        let removed = self.slots.remove(key).is_some();
        if removed {
            self.lru.remove(key);
        }
        removed
    }

    fn ready_len(&self) -> usize {
        self.slots.values().filter(|slot| slot.initialized()).count()
    }
}

// == Shared Memo ==
/// Memo cache safe to share between tasks and threads.
///
/// Concurrent calls for the same key wait on a single evaluation of the
/// computation; calls for different keys run independently. A failed
/// evaluation leaves the key uncached, so the next caller (including one
/// already waiting) evaluates again.
///
/// With `max_entries` set, only finished results are evicted. Keys still
/// being evaluated stay in place, so the cache can briefly hold more
/// entries than its bound.
///
/// The computation is supplied per call rather than stored, which lets it
/// borrow async context. Every call for a given key must compute the same
/// pure function.
#[derive(Debug)]
pub struct SharedMemo<K, V> {
    state: Mutex<SharedState<K, V>>,
    max_entries: Option<usize>,
    max_age: Option<Duration>,
}

impl<K, V> Default for SharedMemo<K, V> {
    fn default() -> Self {
        Self {
            state: Mutex::new(SharedState {
                slots: HashMap::new(),
                lru: LruTracker::default(),
                stats: CacheStats::default(),
            }),
            max_entries: None,
            max_age: None,
        }
    }
}

impl<K, V> SharedMemo<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send + Sync,
{
    // == Constructor ==
    /// Creates an empty, unbounded cache whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache with the bounds from `config`.
    pub fn with_config(config: &MemoConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            max_age: config.max_age,
            ..Self::default()
        }
    }

    // == Get Or Try Compute ==
    /// Returns the cached result for `key`, evaluating `compute` on a miss.
    ///
    /// Errors from `compute` are returned as [`MemoError::ComputationFailed`]
    /// and never cached.
    pub async fn get_or_try_compute<E, C, Fut>(&self, key: K, compute: C) -> Result<V, E>
    where
        C: FnOnce(&K) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let slot = match self.slot_for(&key).await {
            Lookup::Hit(value) => return Ok(value),
            Lookup::Pending(slot) => slot,
        };

        let max_age = self.max_age;
        let key_ref = &key;
        let outcome = slot
            .get_or_try_init(move || async move {
                compute(key_ref)
                    .await
                    .map(|value| CacheEntry::new(value, max_age))
            })
            .await;

        let err = match outcome {
            Ok(entry) => return Ok(entry.value.clone()),
            Err(err) => err,
        };

        let mut state = self.state.lock().await;
        state.stats.record_failure();
        // Waiters still holding the slot retry in place, so only an orphaned
        // empty slot is dropped
        let orphaned = state.slots.get(&key).is_some_and(|current| {
            Arc::ptr_eq(current, &slot) && !current.initialized() && Arc::strong_count(&slot) == 2
        });
        if orphaned {
            state.discard(&key);
        }
        drop(slot);
        debug!("Shared memo computation failed; nothing cached");
        Err(MemoError::ComputationFailed(err))
    }

    /// Infallible form of [`get_or_try_compute`](Self::get_or_try_compute).
    pub async fn get_or_compute<C, Fut>(&self, key: K, compute: C) -> V
    where
        C: FnOnce(&K) -> Fut,
        Fut: Future<Output = V>,
    {
        let result = self
            .get_or_try_compute(key, |key| {
                let fut = compute(key);
                async move { Ok::<V, Infallible>(fut.await) }
            })
            .await;
        match result {
            Ok(value) => value,
            Err(MemoError::ComputationFailed(never)) => match never {},
        }
    }

    /// Resolves `key` to a cached value or to the slot the caller should fill.
    async fn slot_for(&self, key: &K) -> Lookup<V> {
        let mut state = self.state.lock().await;

        if let Some(slot) = state.slots.get(key).cloned() {
            match slot.get() {
                Some(entry) if entry.is_expired() => {
                    state.discard(key);
                    state.stats.record_expiration();
                }
                Some(entry) => {
                    let value = entry.value.clone();
                    state.stats.record_hit();
                    if self.max_entries.is_some() {
                        state.lru.touch(key);
                    }
                    return Lookup::Hit(value);
                }
                None => {
                    // Another caller is evaluating this key; wait on its slot
                    state.stats.record_miss();
                    return Lookup::Pending(slot);
                }
            }
        }

        state.stats.record_miss();
        let slot: Slot<V> = Arc::new(OnceCell::new());
        match self.max_entries {
            Some(0) => return Lookup::Pending(slot),
            Some(max_entries) => {
                let SharedState { slots, lru, stats } = &mut *state;
                // Slots still being computed are never evicted; the map may
                // run over its bound until they finish
                while slots.len() >= max_entries {
                    let Some(evicted) = lru.evict_oldest_where(|k| {
                        slots.get(k).map_or(true, |held| {
                            held.initialized() || Arc::strong_count(held) == 1
                        })
                    }) else {
                        break;
                    };
                    slots.remove(&evicted);
                    stats.record_eviction();
                    debug!("Evicted least recently used shared entry");
                }
                lru.touch(key);
            }
            None => {}
        }
        state.slots.insert(key.clone(), Arc::clone(&slot));
        Lookup::Pending(slot)
    }

    // == Forget ==
    /// Discards every cached result. In-flight evaluations still complete
    /// for their callers but are not kept.
    pub async fn forget(&self) {
        let mut state = self.state.lock().await;
        let removed = state.slots.len();
        state.slots.clear();
        state.lru.clear();
        if removed > 0 {
            debug!("Forgot {} shared memo results", removed);
        }
    }

    /// Returns true if a live result is cached for `key`.
    pub async fn has_cache(&self, key: &K) -> bool {
        let state = self.state.lock().await;
        state
            .slots
            .get(key)
            .and_then(|slot| slot.get())
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Discards the result for `key`. Returns true if a slot existed.
    pub async fn drop_cache(&self, key: &K) -> bool {
        self.state.lock().await.discard(key)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        if self.max_age.is_none() {
            return 0;
        }

        let mut state = self.state.lock().await;
        let now = Instant::now();
        let expired_keys: Vec<K> = state
            .slots
            .iter()
            .filter(|(_, slot)| slot.get().is_some_and(|entry| entry.is_expired_at(now)))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            state.discard(&key);
            state.stats.record_expiration();
        }
        count
    }

    /// Number of completed results currently cached.
    pub async fn len(&self) -> usize {
        self.state.lock().await.ready_len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.ready_len());
        stats
    }
}

enum Lookup<V> {
    Hit(V),
    Pending(Slot<V>),
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_hit_after_first_computation() {
        let memo = SharedMemo::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = memo
                .get_or_compute(3u64, |x| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let x = *x;
                    async move { x * x }
                })
                .await;
            assert_eq!(value, 9);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = memo.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_single_flight() {
        let memo = Arc::new(SharedMemo::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    memo.get_or_compute("slow".to_string(), |key| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let len = key.len();
                        async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            len
                        }
                    })
                    .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 4);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_not_cached() {
        let memo: SharedMemo<i64, f64> = SharedMemo::new();
        let calls = AtomicUsize::new(0);
        let sqrt = |x: &i64| {
            calls.fetch_add(1, Ordering::SeqCst);
            let x = *x;
            async move {
                if x < 0 {
                    Err("negative input")
                } else {
                    Ok((x as f64).sqrt())
                }
            }
        };

        let first = memo.get_or_try_compute(-1, sqrt).await;
        let second = memo.get_or_try_compute(-1, sqrt).await;

        assert_eq!(assert_err!(first), MemoError::ComputationFailed("negative input"));
        assert_err!(second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!memo.has_cache(&-1).await);
        assert_eq!(memo.stats().await.failures, 2);
        assert_eq!(memo.len().await, 0);

        assert_eq!(assert_ok!(memo.get_or_try_compute(9, sqrt).await), 3.0);
    }

    #[tokio::test]
    async fn test_forget_and_drop_cache() {
        let memo = SharedMemo::new();
        memo.get_or_compute(1u8, |x| std::future::ready(*x)).await;
        memo.get_or_compute(2u8, |x| std::future::ready(*x)).await;

        assert!(memo.drop_cache(&1).await);
        assert!(!memo.has_cache(&1).await);
        assert!(memo.has_cache(&2).await);

        memo.forget().await;
        memo.forget().await;
        assert!(memo.is_empty().await);
    }

    #[tokio::test]
    async fn test_bounded_shared_memo_evicts_lru() {
        let config = MemoConfig::default().with_max_entries(2);
        let memo = SharedMemo::with_config(&config);

        for key in [1u32, 2, 1, 3] {
            memo.get_or_compute(key, |x| std::future::ready(x * 10)).await;
        }

        assert!(memo.has_cache(&1).await);
        assert!(!memo.has_cache(&2).await);
        assert!(memo.has_cache(&3).await);
        assert_eq!(memo.stats().await.evictions, 1);
    }

    /// Computes `key * 10` after `delay_ms`, counting evaluations in `calls`
    async fn slow_compute(
        memo: &SharedMemo<u32, u32>,
        key: u32,
        delay_ms: u64,
        calls: &AtomicUsize,
    ) -> u32 {
        memo.get_or_compute(key, |k| {
            calls.fetch_add(1, Ordering::SeqCst);
            let k = *k;
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                k * 10
            }
        })
        .await
    }

    /// Fails on the first evaluation of key 7, succeeds on later ones
    async fn flaky_compute(memo: &SharedMemo<u32, u32>, calls: &AtomicUsize) -> Result<u32, &'static str> {
        memo.get_or_try_compute(7, |k| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            let k = *k;
            async move {
                if attempt == 0 {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err("first attempt failed")
                } else {
                    tokio::time::sleep(Duration::from_millis(80)).await;
                    Ok(k * 10)
                }
            }
        })
        .await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_eviction_skips_slots_still_computing() {
        let config = MemoConfig::default().with_max_entries(1);
        let memo = Arc::new(SharedMemo::with_config(&config));
        let key_one_calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let memo = Arc::clone(&memo);
            let calls = Arc::clone(&key_one_calls);
            tokio::spawn(async move { slow_compute(&memo, 1, 200, &calls).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Key 2 arrives at capacity while key 1 is still running
        let key_two_calls = AtomicUsize::new(0);
        assert_eq!(slow_compute(&memo, 2, 0, &key_two_calls).await, 20);

        // Joins the running evaluation instead of starting another
        assert_eq!(slow_compute(&memo, 1, 200, &key_one_calls).await, 10);
        assert_eq!(first.await.unwrap(), 10);

        assert_eq!(key_one_calls.load(Ordering::SeqCst), 1);
        assert!(memo.has_cache(&1).await);
        assert_eq!(memo.stats().await.evictions, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiter_retry_after_failure_is_shared() {
        let memo = Arc::new(SharedMemo::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let spawn_caller = |delay_ms: u64| {
            let memo = Arc::clone(&memo);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                flaky_compute(&memo, &calls).await
            })
        };

        // First fails at 50ms, second retries until 130ms, third joins at 90ms
        let first = spawn_caller(0);
        let second = spawn_caller(10);
        let third = spawn_caller(90);

        assert_eq!(
            assert_err!(first.await.unwrap()),
            MemoError::ComputationFailed("first attempt failed")
        );
        assert_eq!(assert_ok!(second.await.unwrap()), 70);
        assert_eq!(assert_ok!(third.await.unwrap()), 70);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(memo.has_cache(&7).await);
        assert_eq!(memo.stats().await.failures, 1);
    }

    #[tokio::test]
    async fn test_failed_slot_without_waiters_is_dropped() {
        let config = MemoConfig::default().with_max_entries(1);
        let memo = SharedMemo::with_config(&config);
        let calls = AtomicUsize::new(0);

        assert_err!(flaky_compute(&memo, &calls).await);
        assert!(memo.state.lock().await.slots.is_empty());

        assert_eq!(assert_ok!(flaky_compute(&memo, &calls).await), 70);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let config = MemoConfig::default().with_max_age(Duration::from_millis(40));
        let memo = SharedMemo::with_config(&config);

        memo.get_or_compute(1u8, |x| std::future::ready(*x)).await;
        tokio::time::sleep(Duration::from_millis(70)).await;

        assert!(!memo.has_cache(&1).await);
        assert_eq!(memo.cleanup_expired().await, 1);
        assert!(memo.is_empty().await);
    }
}
