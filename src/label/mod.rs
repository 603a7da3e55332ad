mod mock;
mod remote;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{PhotoUpload, WineInfo};

pub use mock::MockLabelReader;
pub use remote::RemoteLabelReader;

/// Result type for label recognition
pub type LabelResult<T> = Result<T, LabelError>;

/// Errors that can occur while extracting wine details from a label photo
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Label service request failed: {0}")]
    Request(String),

    #[error("Label recognition timed out after {0:?}")]
    Timeout(Duration),

    #[error("Could not read label service response: {0}")]
    Parse(String),

    #[error("Invalid label service configuration: {0}")]
    Config(String),

    #[error("No wine could be recognised on this label")]
    NoMatch,
}

/// Turns a label photo into the wine it shows
#[async_trait]
pub trait LabelReader: Send + Sync {
    async fn read_label(&self, photo: &PhotoUpload) -> LabelResult<WineInfo>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Configuration for label recognition
#[derive(Debug, Clone)]
pub struct LabelConfig {
    /// Remote recognition endpoint (None = use the mock reader)
    pub service_url: Option<String>,
    /// Simulated analysis time for the mock reader
    pub processing_delay: Duration,
    /// Timeout for remote requests
    pub timeout: Duration,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            processing_delay: Duration::from_millis(2000),
            timeout: Duration::from_secs(15),
        }
    }
}

impl LabelConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let service_url = std::env::var("LABEL_SERVICE_URL").ok().and_then(|url| {
            let trimmed = url.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        Self {
            service_url,
            processing_delay: std::env::var("LABEL_PROCESSING_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(2000)),
            timeout: std::env::var("LABEL_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(15)),
        }
    }

    /// Build the configured label reader
    pub fn build_reader(&self) -> LabelResult<Arc<dyn LabelReader>> {
        match &self.service_url {
            Some(url) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(LabelError::Config(format!(
                        "LABEL_SERVICE_URL must be an http(s) URL, got '{}'",
                        url
                    )));
                }
                Ok(Arc::new(RemoteLabelReader::new(url.clone(), self.timeout)?))
            }
            None => Ok(Arc::new(MockLabelReader::new(self.processing_delay))),
        }
    }
}
