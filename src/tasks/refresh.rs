//! Refresh task - keeps the snapshot cache warm

use crate::services::cache::SnapshotCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Background task that periodically refetches the issue snapshot.
///
/// Keeps report requests off the slow path. A failed refresh leaves the
/// previous snapshot in place until its TTL runs out.
pub async fn refresh_task(cache: Arc<SnapshotCache>, every: Duration) {
    let mut interval = tokio::time::interval(every);

    info!(interval_secs = every.as_secs(), "Refresh task started");

    loop {
        interval.tick().await;

        match cache.refresh().await {
            Ok(snapshot) => {
                debug!(
                    records = snapshot.records.len(),
                    malformed = snapshot.malformed,
                    "Snapshot refreshed"
                );
            }
            Err(e) => {
                warn!(error = %e, "Scheduled snapshot refresh failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::metrics::Metrics;
    use crate::services::report_source::testing::FixedReportSource;

    #[tokio::test]
    async fn test_refresh_task_fetches_on_each_tick() {
        let source = Arc::new(FixedReportSource::new(r#"{"issues": []}"#));
        let cache = Arc::new(SnapshotCache::new(
            source.clone(),
            Duration::from_secs(3600),
            Arc::new(Metrics::new()),
        ));

        let handle = tokio::spawn(refresh_task(Arc::clone(&cache), Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(55)).await;
        handle.abort();

        assert!(source.fetches() >= 2);
        assert!(cache.age().is_some());
    }
}
