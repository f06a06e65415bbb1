//! Application state shared across handlers

use crate::models::ClientLookup;
use crate::routes::metrics::Metrics;
use crate::services::cache::SnapshotCache;
use crate::services::report_source::ReportSource;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Memoized issue snapshot in front of the report source
    pub cache: Arc<SnapshotCache>,
    /// Host id to client label table
    pub lookup: Arc<ClientLookup>,
    /// Application metrics for Prometheus
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state
    ///
    /// # Arguments
    /// * `source` - Where issue documents come from
    /// * `cache_ttl` - How long a fetched snapshot stays fresh
    /// * `lookup` - Client lookup table
    pub fn new(source: Arc<dyn ReportSource>, cache_ttl: Duration, lookup: ClientLookup) -> Self {
        let metrics = Arc::new(Metrics::new());
        Self {
            cache: Arc::new(SnapshotCache::new(source, cache_ttl, Arc::clone(&metrics))),
            lookup: Arc::new(lookup),
            metrics,
        }
    }
}
