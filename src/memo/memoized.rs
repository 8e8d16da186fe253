//! Single-threaded memoizing wrapper.

use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::cache::{CacheStats, CacheStore};
use crate::config::MemoConfig;
use crate::error::{MemoError, Result};

// == Memoized ==
/// Wraps a function with a cache keyed by its input.
///
/// Repeat calls with an input already seen return the stored result
/// without invoking the function again. The wrapper owns its cache; two
/// wrappers around the same function share nothing.
///
/// # Purity
///
/// The wrapped function must be a pure function of its input. Anything it
/// does besides returning a value (logging, counters, I/O) is skipped on a
/// cache hit, and a function whose output drifts over time will keep
/// returning the first result until [`forget`](Self::forget) is called or
/// the entry outlives `max_age`.
///
/// # Cost
///
/// Each distinct input costs one stored entry. The trade only pays off when
/// evaluating the function is much more expensive than hashing the key and
/// cloning the result; for cheap functions the wrapper is slower than a
/// direct call.
///
/// # Concurrency
///
/// Calls take `&mut self`, so a `Memoized` is used from one thread at a
/// time. Wrap it in a lock for shared use, or use
/// [`SharedMemo`](crate::memo::SharedMemo) for per-key single-flight.
///
/// # Keys
///
/// Inputs must implement `Eq + Hash + Clone`. Functions of several
/// arguments are memoized by taking a tuple.
pub struct Memoized<K, V, F> {
    func: F,
    store: CacheStore<K, V>,
}

impl<K, V, F> Memoized<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Wraps `func` with an empty, unbounded cache whose entries never expire.
    pub fn new(func: F) -> Self {
        Self {
            func,
            store: CacheStore::unbounded(),
        }
    }

    /// Wraps `func` with the bounds from `config`.
    pub fn with_config(func: F, config: &MemoConfig) -> Self {
        Self {
            func,
            store: CacheStore::new(config.max_entries, config.max_age),
        }
    }

    // == Forget ==
    /// Discards every cached result.
    ///
    /// Subsequent calls behave as on a freshly constructed wrapper.
    /// Clearing an empty cache is a no-op.
    pub fn forget(&mut self) {
        let removed = self.store.clear();
        if removed > 0 {
            debug!("Forgot {} memoized results", removed);
        }
    }

    /// Returns true if a live result is cached for `key`.
    pub fn has_cache(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    /// Discards the cached result for `key`. Returns true if one existed.
    pub fn drop_cache(&mut self, key: &K) -> bool {
        self.store.remove(key)
    }

    /// Removes entries that outlived `max_age`. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.store.cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Borrows the wrapped function.
    pub fn inner(&self) -> &F {
        &self.func
    }

    /// Consumes the wrapper, dropping the cache.
    pub fn into_inner(self) -> F {
        self.func
    }

    fn lookup_or_compute<E>(
        &mut self,
        key: K,
        compute: impl FnOnce(&mut F, &K) -> std::result::Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.store.get(&key) {
            trace!("Memo hit");
            return Ok(value);
        }

        match compute(&mut self.func, &key) {
            Ok(value) => {
                self.store.insert(key, value.clone());
                debug!("Memo miss, cached result ({} entries)", self.store.len());
                Ok(value)
            }
            Err(err) => {
                self.store.record_failure();
                debug!("Memo miss, computation failed; nothing cached");
                Err(MemoError::ComputationFailed(err))
            }
        }
    }
}

impl<K, V, F> Memoized<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnMut(&K) -> V,
{
    // == Call ==
    /// Returns `func(key)`, evaluating it only on the first call with `key`.
    pub fn call(&mut self, key: K) -> V {
        match self.lookup_or_compute(key, |func, key| Ok::<V, Infallible>(func(key))) {
            Ok(value) => value,
            Err(MemoError::ComputationFailed(never)) => match never {},
        }
    }
}

impl<K, V, F> Memoized<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Try Call ==
    /// Returns `func(key)` for a fallible function.
    ///
    /// Successful results are cached. An error is returned as
    /// [`MemoError::ComputationFailed`] and is never cached, so the next call
    /// with the same input evaluates `func` again.
    pub fn try_call<E>(&mut self, key: K) -> Result<V, E>
    where
        F: FnMut(&K) -> std::result::Result<V, E>,
    {
        self.lookup_or_compute(key, |func, key| func(key))
    }
}

impl<K, V, F> fmt::Debug for Memoized<K, V, F>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

// == Free Functions ==
/// Wraps `func` with an empty cache. Shorthand for [`Memoized::new`].
///
/// `K` and `V` are inferred from the first [`call`](Memoized::call) or
/// [`try_call`](Memoized::try_call). A wrapper that is never called needs
/// an annotation such as `Memoized<i32, i32, _>`.
pub fn memoize<K, V, F>(func: F) -> Memoized<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    Memoized::new(func)
}

/// Clears every cached result of `memo`. Shorthand for [`Memoized::forget`].
pub fn forget<K, V, F>(memo: &mut Memoized<K, V, F>)
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    memo.forget();
}
