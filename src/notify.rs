//! Downstream notification: deliver the assembled record over HTTP.
//!
//! Delivery is fire-and-forget. The record is already durably persisted
//! by the time the notifier runs, so a failed POST is logged and the
//! pipeline run still completes; the downstream system can always fetch
//! the record from storage instead.

use crate::model::ResultRecord;
use tracing::{error, info};

/// Delivers result records to a configured HTTP endpoint.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: String,
}

impl Notifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// POST the record as JSON. HTTP 200 counts as delivered; any other
    /// status or transport error is logged and swallowed.
    ///
    /// Returns whether delivery succeeded, for observability only —
    /// callers must not fail the pipeline on `false`.
    pub async fn send(&self, record: &ResultRecord) -> bool {
        match self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
        {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                info!(
                    "delivered entities for '{}' to {}",
                    record.tracking_id, self.endpoint
                );
                true
            }
            Ok(response) => {
                error!(
                    "failed to deliver entities for '{}' to {}: status {}",
                    record.tracking_id,
                    self.endpoint,
                    response.status()
                );
                false
            }
            Err(e) => {
                error!(
                    "failed to deliver entities for '{}' to {}: {e}",
                    record.tracking_id, self.endpoint
                );
                false
            }
        }
    }
}
