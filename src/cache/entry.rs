//! Cache Entry Module
//!
//! Defines the structure for individual memoized results with expiry support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single memoized result with its lifetime metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored result
    pub value: V,
    /// When the result was computed
    pub created_at: Instant,
    /// When the result stops being served, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with an optional lifetime.
    ///
    /// # Arguments
    /// * `value` - The result to store
    /// * `max_age` - Optional lifetime measured from now
    pub fn new(value: V, max_age: Option<Duration>) -> Self {
        let now = Instant::now();
        // A lifetime too large to represent never expires.
        let expires_at = max_age.and_then(|age| now.checked_add(age));

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has a lifetime and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }

    /// Age of the stored result.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
