//! Durable history of delivered links.
//!
//! Available backends:
//! - [`SqliteStore`] - file-backed, survives restarts (the production store)
//! - [`MemoryStore`] - in-process map for tests
//!
//! Records are never expired. `mark_seen` is insert-if-absent: marking a
//! link twice leaves one record and is not an error.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::PublishedRecord;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Set of links that were already delivered.
pub trait DedupStore {
    /// Whether `url` has been marked as delivered.
    async fn seen(&self, url: &str) -> Result<bool, StoreError>;

    /// Remember `url` as delivered by `source_name` at `at`.
    ///
    /// Returns `true` if a record was created, `false` if one already existed.
    async fn mark_seen(
        &self,
        url: &str,
        source_name: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Look up the record for `url`.
    async fn record(&self, url: &str) -> Result<Option<PublishedRecord>, StoreError>;

    /// Number of records, optionally restricted to one source.
    async fn count(&self, source_name: Option<&str>) -> Result<u64, StoreError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Shared behavioral checks run against every backend.
    pub(crate) async fn check_dedup_invariants<S: DedupStore>(store: &S) {
        let url = "https://www.tourdom.ru/news/1.html";
        let first = Utc::now();

        assert!(!store.seen(url).await.unwrap());
        assert!(store.record(url).await.unwrap().is_none());

        assert!(store.mark_seen(url, "TourDom", first).await.unwrap());
        assert!(store.seen(url).await.unwrap());

        for _ in 0..3 {
            assert!(!store.mark_seen(url, "Other", Utc::now()).await.unwrap());
            assert!(store.seen(url).await.unwrap());
        }

        assert_eq!(store.count(None).await.unwrap(), 1);
        assert_eq!(store.count(Some("TourDom")).await.unwrap(), 1);
        assert_eq!(store.count(Some("Other")).await.unwrap(), 0);

        let record = store.record(url).await.unwrap().expect("record exists");
        assert_eq!(record.url, url);
        assert_eq!(record.source_name, "TourDom");
        assert_eq!(record.published_at.timestamp(), first.timestamp());

        assert!(!store.seen("https://www.tourdom.ru/news/2.html").await.unwrap());
    }
}
