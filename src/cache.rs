use std::collections::HashMap;
use std::fmt;

use blake3::Hasher;
use chrono::{DateTime, Utc};

use crate::domain::identity::UserId;

/// Hashed identity of a cached query, e.g. "all tickets for user X".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn compute(parts: &[&str]) -> Self {
        let mut hasher = Hasher::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn tickets(owner: Option<&UserId>) -> Self {
        match owner {
            Some(owner) => Self::compute(&["tickets", owner.as_str()]),
            None => Self::compute(&["tickets"]),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..12])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Loading,
    Success,
    Error,
}

/// Point-in-time view of one cache entry for presentation code.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<String>,
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: Option<T>,
    error: Option<String>,
    stale: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            stale: true,
            updated_at: None,
        }
    }
}

/// Client-side read cache. Entries go stale on invalidation and are
/// replaced by whichever fetch completes last.
#[derive(Debug)]
pub struct QueryCache<T> {
    entries: HashMap<QueryKey, CacheEntry<T>>,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Clone> QueryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached data, only while the entry is still fresh.
    pub fn fresh(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .get(key)
            .filter(|entry| !entry.stale)
            .and_then(|entry| entry.data.clone())
    }

    pub fn store(&mut self, key: &QueryKey, data: T, fetched_at: DateTime<Utc>) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.data = Some(data);
        entry.error = None;
        entry.stale = false;
        entry.updated_at = Some(fetched_at);
    }

    /// Records a failed fetch; previously fetched data stays readable.
    pub fn store_error(&mut self, key: &QueryKey, message: String) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.error = Some(message);
        entry.stale = true;
    }

    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self, key: &QueryKey) -> QuerySnapshot<T> {
        let Some(entry) = self.entries.get(key) else {
            return QuerySnapshot {
                status: QueryStatus::Loading,
                data: None,
                error: None,
                is_stale: true,
                updated_at: None,
            };
        };

        let status = match (&entry.error, &entry.data) {
            (Some(_), _) => QueryStatus::Error,
            (None, Some(_)) => QueryStatus::Success,
            (None, None) => QueryStatus::Loading,
        };

        QuerySnapshot {
            status,
            data: entry.data.clone(),
            error: entry.error.clone(),
            is_stale: entry.stale,
            updated_at: entry.updated_at,
        }
    }
}
