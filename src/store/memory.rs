//! In-memory dedup store for tests.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::DedupStore;
use crate::error::StoreError;
use crate::models::PublishedRecord;

/// Map-backed store. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, PublishedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, PublishedRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DedupStore for MemoryStore {
    async fn seen(&self, url: &str) -> Result<bool, StoreError> {
        Ok(self.records().contains_key(url))
    }

    async fn mark_seen(
        &self,
        url: &str,
        source_name: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.records().entry(url.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(PublishedRecord {
                    url: url.to_string(),
                    source_name: source_name.to_string(),
                    published_at: at,
                });
                Ok(true)
            }
        }
    }

    async fn record(&self, url: &str) -> Result<Option<PublishedRecord>, StoreError> {
        Ok(self.records().get(url).cloned())
    }

    async fn count(&self, source_name: Option<&str>) -> Result<u64, StoreError> {
        let records = self.records();
        let n = match source_name {
            None => records.len(),
            Some(name) => records.values().filter(|r| r.source_name == name).count(),
        };
        Ok(n as u64)
    }
}
