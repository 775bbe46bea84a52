use super::{CommitRecord, Platform};
use crate::error::ExtractionError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type CollectFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<CommitRecord>, ExtractionError>> + Send + 'a>>;

/// Normalized commit retrieval for one platform.
pub trait Collector: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetch commits newest-first, optionally only those at or after `since`.
    ///
    /// Any transport, status or rate-limit failure aborts the whole fetch.
    fn fetch_commits<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> CollectFuture<'a>;
}

/// Collectors keyed by platform.
#[derive(Clone, Default)]
pub struct CollectorSet {
    collectors: HashMap<Platform, Arc<dyn Collector>>,
}

impl CollectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collector: Arc<dyn Collector>) -> Self {
        self.insert(collector);
        self
    }

    pub fn insert(&mut self, collector: Arc<dyn Collector>) {
        self.collectors.insert(collector.platform(), collector);
    }

    pub fn get(&self, platform: Platform) -> Result<Arc<dyn Collector>, ExtractionError> {
        self.collectors
            .get(&platform)
            .cloned()
            .ok_or_else(|| ExtractionError::UnsupportedPlatform(platform.to_string()))
    }
}
