//! Keyed response cache with validator-based revalidation.
//!
//! The source application kept its hosting-API responses in module-global
//! maps keyed by URL, revalidated with ETags. Here the cache is an explicit
//! keyed store behind an accessor interface, held by the client that uses
//! it.

use std::collections::HashMap;

use serde_json::Value;
use time::{Duration, OffsetDateTime};

/// One cached response: the value, its validator, and when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    value: Value,
    etag: Option<String>,
    fetched_at: OffsetDateTime,
}

impl CacheEntry {
    /// The cached response body.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The validator recorded with this entry, if the server sent one.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

/// A keyed store of cached responses with a freshness window.
///
/// Entries younger than the freshness window are served without a network
/// round trip. Older entries keep their validator so the next request can
/// revalidate with `If-None-Match` instead of refetching the body.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    max_age: Duration,
}

impl ResponseCache {
    /// Creates a cache whose entries stay fresh for `max_age`.
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_age,
        }
    }

    /// Returns the cached value for `key` if it is still fresh.
    pub fn fresh(&self, key: &str) -> Option<&Value> {
        let entry = self.entries.get(key)?;
        if OffsetDateTime::now_utc() - entry.fetched_at < self.max_age {
            Some(&entry.value)
        } else {
            None
        }
    }

    /// Returns the cached value for `key` regardless of age.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(CacheEntry::value)
    }

    /// Returns the validator for `key` regardless of age.
    pub fn validator(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(CacheEntry::etag)
    }

    /// Stores a value with its validator, stamped now.
    pub fn insert(&mut self, key: impl Into<String>, value: Value, etag: Option<String>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                etag,
                fetched_at: OffsetDateTime::now_utc(),
            },
        );
    }

    /// Refreshes the timestamp of an entry the server just revalidated.
    pub fn touch(&mut self, key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.fetched_at = OffsetDateTime::now_utc();
        }
    }

    /// Removes the entry for `key`.
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
