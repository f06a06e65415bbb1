//! Snapshot cache - time-bounded memoization of the ingested issue document

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::enrich::parse_timestamp;
use crate::pipeline::ingest::{self, Ingested};
use crate::routes::metrics::Metrics;
use crate::services::report_source::ReportSource;

struct CachedSnapshot {
    snapshot: Arc<Ingested>,
    fetched_at: Instant,
}

/// Memoizes the last successfully ingested snapshot for `ttl`.
///
/// Failed fetches are never cached, so the next caller retries. Misses are
/// serialized: while one fetch is in flight, other callers wait for it
/// instead of issuing their own.
pub struct SnapshotCache {
    source: Arc<dyn ReportSource>,
    ttl: Duration,
    entry: RwLock<Option<CachedSnapshot>>,
    refresh_lock: Mutex<()>,
    metrics: Arc<Metrics>,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn ReportSource>, ttl: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            metrics,
        }
    }

    /// Current snapshot, fetching a new one if the cached one expired.
    pub async fn get(&self) -> Result<Arc<Ingested>> {
        self.load(true).await
    }

    /// Same as [`get`](Self::get) but not counted as a cache hit; for probes.
    pub async fn ensure_loaded(&self) -> Result<Arc<Ingested>> {
        self.load(false).await
    }

    /// Fetch unconditionally and replace the cached snapshot on success.
    pub async fn refresh(&self) -> Result<Arc<Ingested>> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_store().await
    }

    /// Drop the cached snapshot; the next `get` fetches.
    pub fn invalidate(&self) {
        if self.entry.write().take().is_some() {
            info!("Snapshot cache invalidated");
        }
    }

    /// Age of the cached snapshot, if any
    pub fn age(&self) -> Option<Duration> {
        self.entry.read().as_ref().map(|e| e.fetched_at.elapsed())
    }

    pub fn source(&self) -> String {
        self.source.describe()
    }

    async fn load(&self, count_hit: bool) -> Result<Arc<Ingested>> {
        if let Some(snapshot) = self.fresh() {
            if count_hit {
                self.metrics.inc_cache_hits();
            }
            return Ok(snapshot);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.fresh() {
            if count_hit {
                self.metrics.inc_cache_hits();
            }
            return Ok(snapshot);
        }

        self.fetch_and_store().await
    }

    fn fresh(&self) -> Option<Arc<Ingested>> {
        self.entry
            .read()
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.snapshot))
    }

    async fn fetch_and_store(&self) -> Result<Arc<Ingested>> {
        self.metrics.inc_fetches();

        let result = match self.source.fetch().await {
            Ok(body) => ingest::parse_document(&body),
            Err(e) => Err(e),
        };

        let ingested = match result {
            Ok(ingested) => Arc::new(ingested),
            Err(e) => {
                self.metrics.inc_failures();
                warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "Failed to load issue snapshot"
                );
                return Err(e);
            }
        };

        // Undated records survive ingestion but every report drops them
        let undated = ingested
            .records
            .iter()
            .filter(|record| parse_timestamp(&record.reported_date).is_none())
            .count();
        self.metrics.inc_skipped((ingested.malformed + undated) as u64);
        self.metrics.set_snapshot_issues((ingested.records.len() - undated) as u64);
        debug!(
            records = ingested.records.len(),
            malformed = ingested.malformed,
            undated = undated,
            "Issue snapshot cached"
        );

        *self.entry.write() = Some(CachedSnapshot {
            snapshot: Arc::clone(&ingested),
            fetched_at: Instant::now(),
        });

        Ok(ingested)
    }
}
