//! Top-level pipeline entry points.
//!
//! Three granularities, composing the same stages:
//!
//! * [`ingest`]   — dispatch one source document (split + submit + manifest)
//! * [`retrieve`] — poll a manifest to completion and assemble its record
//! * [`process`]  — ingest, retrieve, and notify, end to end
//!
//! [`ingest_all`] scans an intake bucket and fans [`ingest`] out across
//! documents. Invocations for different documents share no mutable state,
//! so the fan-out needs no coordination beyond a concurrency cap.

use crate::analysis::DocumentAnalysis;
use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::model::{Manifest, ResultRecord};
use crate::notify::Notifier;
use crate::pipeline::{assemble, dispatch, poll};
use crate::storage::{self, ObjectStore, StorageError};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

/// Ingest one source document from the intake bucket.
///
/// Splits the document, dispatches one analysis job per page, persists
/// the manifest, and relocates the source. Returns the manifest.
pub async fn ingest(
    store: &dyn ObjectStore,
    analysis: &dyn DocumentAnalysis,
    config: &IntakeConfig,
    intake_bucket: &str,
    key: &str,
) -> Result<Manifest, IntakeError> {
    dispatch::dispatch_document(store, analysis, config, intake_bucket, key).await
}

/// Load the persisted manifest for a tracking id.
///
/// A missing manifest is [`IntakeError::ManifestNotFound`]
/// (404-equivalent), never retried.
pub async fn load_manifest(
    store: &dyn ObjectStore,
    config: &IntakeConfig,
    tracking_id: &str,
) -> Result<Manifest, IntakeError> {
    match store
        .get(&config.output_bucket, &storage::manifest_key(tracking_id))
        .await
    {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            IntakeError::Internal(format!("manifest for '{tracking_id}' is not valid JSON: {e}"))
        }),
        Err(StorageError::NotFound { .. }) => {
            warn!("jobs manifest for '{tracking_id}' not found");
            Err(IntakeError::ManifestNotFound {
                tracking_id: tracking_id.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Poll a document's jobs to completion and assemble its result record.
///
/// The record is persisted at the entities key and returned. Re-invoking
/// with the same tracking id re-derives the identical record.
pub async fn retrieve(
    store: &dyn ObjectStore,
    analysis: &dyn DocumentAnalysis,
    config: &IntakeConfig,
    tracking_id: &str,
) -> Result<ResultRecord, IntakeError> {
    let manifest = load_manifest(store, config, tracking_id).await?;
    poll::wait_for_completion(analysis, &manifest, config.poll_policy()).await?;
    info!("jobs for '{tracking_id}' are complete, extracting entities");
    assemble::assemble_record(store, analysis, config, &manifest).await
}

/// Run the whole pipeline for one source document: ingest, retrieve, and
/// (when a notifier is given) deliver the record downstream.
///
/// Notification failure never fails the run — the record is already
/// persisted by then.
pub async fn process(
    store: &dyn ObjectStore,
    analysis: &dyn DocumentAnalysis,
    notifier: Option<&Notifier>,
    config: &IntakeConfig,
    intake_bucket: &str,
    key: &str,
) -> Result<ResultRecord, IntakeError> {
    let manifest = ingest(store, analysis, config, intake_bucket, key).await?;
    let record = retrieve(store, analysis, config, &manifest.tracking_id).await?;
    if let Some(notifier) = notifier {
        notifier.send(&record).await;
    }
    Ok(record)
}

/// Ingest every `.pdf` object in the intake bucket, at most
/// `config.concurrency` documents in flight at once.
///
/// Documents are independent: one failing does not stop the others. Each
/// key is returned with its own outcome; failures are also logged here.
pub async fn ingest_all(
    store: &dyn ObjectStore,
    analysis: &dyn DocumentAnalysis,
    config: &IntakeConfig,
    intake_bucket: &str,
) -> Result<Vec<(String, Result<Manifest, IntakeError>)>, IntakeError> {
    let keys: Vec<String> = store
        .list(intake_bucket)
        .await?
        .into_iter()
        .filter(|k| k.to_ascii_lowercase().ends_with(".pdf"))
        .collect();
    info!(
        "ingesting {} document(s) from bucket '{intake_bucket}'",
        keys.len()
    );

    let outcomes: Vec<(String, Result<Manifest, IntakeError>)> =
        stream::iter(keys.into_iter().map(|key| async move {
            let outcome = ingest(store, analysis, config, intake_bucket, &key).await;
            if let Err(e) = &outcome {
                error!("ingest failed for '{key}': {e}");
            }
            (key, outcome)
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    Ok(outcomes)
}
