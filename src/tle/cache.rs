use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::tle::ElementSet;

pub const CACHE_TTL: Duration = Duration::hours(24);

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub element_set: ElementSet,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at < CACHE_TTL
    }
}

/// Most recently fetched element set per object identifier.
///
/// Entries are never evicted; staleness is judged by the caller on read.
pub struct TleCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TleCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, object_id: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        entries.get(object_id).cloned()
    }

    /// Insert or replace the entry for `object_id`
    pub async fn put(&self, object_id: &str, element_set: ElementSet, fetched_at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            object_id.to_string(),
            CacheEntry {
                element_set,
                fetched_at,
            },
        );
    }
}

impl Default for TleCache {
    fn default() -> Self {
        Self::new()
    }
}
