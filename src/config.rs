//! Configuration for the intake pipeline.
//!
//! Every knob lives in one [`IntakeConfig`] struct, built via its builder
//! or loaded from the environment with [`IntakeConfig::from_env`]. Nothing
//! here touches external collaborators at construction time; bucket
//! validation is a separate, explicit startup step
//! ([`IntakeConfig::validate_store`]) so constructing a config never has
//! side effects.

use crate::error::IntakeError;
use crate::pipeline::poll::PollPolicy;
use crate::storage::ObjectStore;
use std::time::Duration;

/// Environment variable naming the output bucket (required).
pub const ENV_OUTPUT_BUCKET: &str = "OUTPUT_BUCKET";
/// Environment variable naming the notification endpoint URL (required).
pub const ENV_NOTIFY_ENDPOINT: &str = "NOTIFY_ENDPOINT";
/// Environment variable overriding the signature-confidence threshold.
pub const ENV_SIGNATURE_THRESHOLD: &str = "SIGNATURE_THRESHOLD";
/// Environment variable overriding the blank-page word-count threshold.
pub const ENV_BLANK_PAGE_THRESHOLD: &str = "BLANK_PAGE_THRESHOLD";

/// Configuration for one pipeline deployment.
///
/// # Example
/// ```rust
/// use rfs_intake::IntakeConfig;
///
/// let config = IntakeConfig::builder("outbound-jsons")
///     .signature_threshold(65.0)
///     .blank_page_threshold(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.output_bucket, "outbound-jsons");
/// ```
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Bucket receiving split pages, the manifest, the relocated source,
    /// and the result record. Required.
    pub output_bucket: String,

    /// Downstream notification endpoint URL. `None` disables delivery;
    /// [`IntakeConfig::from_env`] requires it.
    pub notify_endpoint: Option<String>,

    /// Minimum signature-detection confidence (0–100) for the signed
    /// verdict. Inclusive: confidence equal to the threshold counts as
    /// signed. Default: 50.0.
    pub signature_threshold: f64,

    /// Pages with fewer than this many recognised words classify as
    /// blank. Exclusive: exactly this many words is not blank.
    /// Default: 20.
    pub blank_page_threshold: usize,

    /// Maximum poll passes over a manifest before giving up. Default: 60.
    pub poll_max_attempts: u32,

    /// Fixed wait between poll passes. Default: 5 s. Together with the
    /// default attempt budget this allows roughly five minutes of
    /// processing per document.
    pub poll_interval: Duration,

    /// Number of documents ingested concurrently by
    /// [`crate::intake::ingest_all`]. Within one document, dispatch and
    /// polling stay sequential. Default: 4.
    pub concurrency: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            output_bucket: String::new(),
            notify_endpoint: None,
            signature_threshold: 50.0,
            blank_page_threshold: 20,
            poll_max_attempts: 60,
            poll_interval: Duration::from_secs(5),
            concurrency: 4,
        }
    }
}

impl IntakeConfig {
    /// Create a builder with the required output bucket set.
    pub fn builder(output_bucket: impl Into<String>) -> IntakeConfigBuilder {
        IntakeConfigBuilder {
            config: IntakeConfig {
                output_bucket: output_bucket.into(),
                ..IntakeConfig::default()
            },
        }
    }

    /// Load configuration from the environment.
    ///
    /// `OUTPUT_BUCKET` and `NOTIFY_ENDPOINT` are required;
    /// `SIGNATURE_THRESHOLD` and `BLANK_PAGE_THRESHOLD` override the
    /// defaults when present and parseable.
    pub fn from_env() -> Result<Self, IntakeError> {
        let output_bucket = require_env(ENV_OUTPUT_BUCKET)?;
        let notify_endpoint = require_env(ENV_NOTIFY_ENDPOINT)?;

        let mut builder = Self::builder(output_bucket).notify_endpoint(notify_endpoint);
        if let Some(raw) = optional_env(ENV_SIGNATURE_THRESHOLD) {
            let value: f64 = raw.parse().map_err(|_| {
                IntakeError::InvalidConfig(format!(
                    "{ENV_SIGNATURE_THRESHOLD} must be a number, got '{raw}'"
                ))
            })?;
            builder = builder.signature_threshold(value);
        }
        if let Some(raw) = optional_env(ENV_BLANK_PAGE_THRESHOLD) {
            let value: usize = raw.parse().map_err(|_| {
                IntakeError::InvalidConfig(format!(
                    "{ENV_BLANK_PAGE_THRESHOLD} must be an integer, got '{raw}'"
                ))
            })?;
            builder = builder.blank_page_threshold(value);
        }
        builder.build()
    }

    /// Poll policy derived from this config.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.poll_max_attempts,
            interval: self.poll_interval,
        }
    }

    /// Explicit startup check: the output bucket must exist.
    ///
    /// Run once at process start, before accepting work.
    pub async fn validate_store(&self, store: &dyn ObjectStore) -> Result<(), IntakeError> {
        if store.bucket_exists(&self.output_bucket).await? {
            Ok(())
        } else {
            Err(IntakeError::InvalidConfig(format!(
                "output bucket '{}' does not exist",
                self.output_bucket
            )))
        }
    }
}

fn require_env(name: &str) -> Result<String, IntakeError> {
    optional_env(name)
        .ok_or_else(|| IntakeError::InvalidConfig(format!("{name} environment variable is not set")))
}

fn optional_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Builder for [`IntakeConfig`].
#[derive(Debug)]
pub struct IntakeConfigBuilder {
    config: IntakeConfig,
}

impl IntakeConfigBuilder {
    pub fn notify_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.notify_endpoint = Some(url.into());
        self
    }

    pub fn signature_threshold(mut self, threshold: f64) -> Self {
        self.config.signature_threshold = threshold;
        self
    }

    pub fn blank_page_threshold(mut self, words: usize) -> Self {
        self.config.blank_page_threshold = words;
        self
    }

    pub fn poll_max_attempts(mut self, attempts: u32) -> Self {
        self.config.poll_max_attempts = attempts;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IntakeConfig, IntakeError> {
        let c = &self.config;
        if c.output_bucket.trim().is_empty() {
            return Err(IntakeError::InvalidConfig(
                "output bucket must not be empty".into(),
            ));
        }
        if !(0.0..=100.0).contains(&c.signature_threshold) {
            return Err(IntakeError::InvalidConfig(format!(
                "signature threshold must be 0–100, got {}",
                c.signature_threshold
            )));
        }
        if c.poll_max_attempts == 0 {
            return Err(IntakeError::InvalidConfig(
                "poll attempt budget must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_contract() {
        let config = IntakeConfig::builder("outbound").build().unwrap();
        assert_eq!(config.signature_threshold, 50.0);
        assert_eq!(config.blank_page_threshold, 20);
        assert_eq!(config.poll_max_attempts, 60);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn empty_bucket_is_rejected() {
        let err = IntakeConfig::builder("  ").build().unwrap_err();
        assert!(matches!(err, IntakeError::InvalidConfig(_)));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = IntakeConfig::builder("outbound")
            .signature_threshold(120.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, IntakeError::InvalidConfig(_)));
    }

    #[test]
    fn zero_poll_budget_is_rejected() {
        let err = IntakeConfig::builder("outbound")
            .poll_max_attempts(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, IntakeError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn validate_store_requires_output_bucket() {
        use crate::storage::MemoryStore;

        let config = IntakeConfig::builder("outbound").build().unwrap();
        let store = MemoryStore::new();
        assert!(config.validate_store(&store).await.is_err());

        store.create_bucket("outbound");
        config.validate_store(&store).await.unwrap();
    }
}
