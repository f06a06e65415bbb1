//! Report source - retrieves the raw issue document

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Anything that can hand back the raw `{"issues": [...]}` document
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetch the document body. Any failure is `DataUnavailable`.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human readable origin, for logs
    fn describe(&self) -> String;
}

/// Report source backed by the analytics HTTPS endpoint
#[derive(Clone)]
pub struct HttpReportSource {
    client: Client,
    url: String,
}

impl HttpReportSource {
    /// Create a new HTTP source
    ///
    /// # Arguments
    /// * `url` - Endpoint returning the issue document
    /// * `timeout` - Whole-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("issue-insights/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let url = url.into();
        info!(url = %url, timeout_secs = timeout.as_secs(), "HTTP report source configured");

        Ok(Self { client, url })
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::DataUnavailable(format!(
                "Report source returned HTTP {}",
                status
            )));
        }

        let body = response.bytes().await?;
        debug!(url = %self.url, bytes = body.len(), "Fetched issue document");

        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source that counts how often it was asked
    pub struct FixedReportSource {
        body: Mutex<std::result::Result<Vec<u8>, String>>,
        fetches: AtomicUsize,
    }

    impl FixedReportSource {
        pub fn new(body: impl Into<Vec<u8>>) -> Self {
            Self {
                body: Mutex::new(Ok(body.into())),
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn failing(reason: &str) -> Self {
            Self {
                body: Mutex::new(Err(reason.to_string())),
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn set_body(&self, body: impl Into<Vec<u8>>) {
            *self.body.lock() = Ok(body.into());
        }

        pub fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportSource for FixedReportSource {
        async fn fetch(&self) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match &*self.body.lock() {
                Ok(body) => Ok(body.clone()),
                Err(reason) => Err(AppError::DataUnavailable(reason.clone())),
            }
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_data_unavailable() {
        let source =
            HttpReportSource::new("http://127.0.0.1:9/issues", Duration::from_secs(2)).unwrap();
        let result = source.fetch().await;
        assert!(matches!(result, Err(AppError::DataUnavailable(_))));
        assert_eq!(source.describe(), "http://127.0.0.1:9/issues");
    }
}
