//! Most-recent report holder
//!
//! One slot, last writer wins. Readers get an `Arc` to a complete report or
//! nothing; a partially built report is never observable.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::NotFoundError;
use crate::models::Report;

#[derive(Clone, Default)]
pub struct ReportStore {
    latest: Arc<RwLock<Option<Arc<Report>>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent report, or [`NotFoundError`] before the first audit.
    pub async fn get(&self) -> Result<Arc<Report>, NotFoundError> {
        self.latest.read().await.clone().ok_or(NotFoundError)
    }

    pub async fn set(&self, report: Arc<Report>) {
        *self.latest.write().await = Some(report);
    }

    pub async fn is_empty(&self) -> bool {
        self.latest.read().await.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::compliant_report;
    use crate::models::NormalizedUrl;

    #[tokio::test]
    async fn test_empty_store_is_not_found() {
        let store = ReportStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.get().await.unwrap_err(), NotFoundError);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = ReportStore::new();
        let first = Arc::new(compliant_report());
        let mut second = compliant_report();
        second.url = NormalizedUrl::parse("https://second.example").unwrap();
        second.score = 42;

        store.set(first.clone()).await;
        assert_eq!(store.get().await.unwrap().score, 100);

        store.set(Arc::new(second)).await;
        let latest = store.get().await.unwrap();
        assert_eq!(latest.score, 42);
        assert_eq!(latest.url.as_str(), "https://second.example");
        // earlier readers keep their snapshot
        assert_eq!(first.score, 100);
    }

    #[tokio::test]
    async fn test_clones_share_the_slot() {
        let store = ReportStore::new();
        let handle = store.clone();
        handle.set(Arc::new(compliant_report())).await;
        assert!(!store.is_empty().await);
    }
}
