use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::tle::{parse_element_set, ElementSet, FetchError, TleCache, TleSource};

/// Cache-first element set retrieval.
///
/// Refreshes are serialized per object identifier, so concurrent requests for
/// the same stale id trigger a single remote fetch.
pub struct TleFetcher {
    cache: Arc<TleCache>,
    source: Arc<dyn TleSource>,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TleFetcher {
    pub fn new(cache: Arc<TleCache>, source: Arc<dyn TleSource>) -> Self {
        Self {
            cache,
            source,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn fetch(&self, object_id: &str) -> Result<ElementSet, FetchError> {
        self.fetch_at(object_id, Utc::now()).await
    }

    /// Same as [`TleFetcher::fetch`] with an explicit notion of "now", used
    /// both for the freshness check and as the stored fetch timestamp.
    pub async fn fetch_at(
        &self,
        object_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ElementSet, FetchError> {
        if let Some(element_set) = self.fresh(object_id, now).await {
            log::debug!("Element set cache hit for {}", object_id);
            return Ok(element_set);
        }

        let lock = self.refresh_lock(object_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.refresh(object_id, now).await
        };
        self.release_refresh_lock(object_id, lock).await;
        result
    }

    async fn refresh(
        &self,
        object_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ElementSet, FetchError> {
        // Another request may have refreshed the entry while we waited
        if let Some(element_set) = self.fresh(object_id, now).await {
            log::debug!("Element set for {} refreshed by concurrent request", object_id);
            return Ok(element_set);
        }

        log::info!("Fetching element set for {} from remote source", object_id);
        let text = self.source.fetch_text(object_id).await?;
        let element_set = parse_element_set(&text)?;

        self.cache.put(object_id, element_set.clone(), now).await;
        Ok(element_set)
    }

    async fn fresh(&self, object_id: &str, now: DateTime<Utc>) -> Option<ElementSet> {
        self.cache
            .get(object_id)
            .await
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.element_set)
    }

    async fn refresh_lock(&self, object_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(object_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the per-id lock once no other request is waiting on it
    async fn release_refresh_lock(&self, object_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.refresh_locks.lock().await;
        // One reference in the map, one held by this caller
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(object_id);
        }
    }

    #[cfg(test)]
    async fn refresh_lock_count(&self) -> usize {
        self.refresh_locks.lock().await.len()
    }
}
