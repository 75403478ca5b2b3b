//! Analysis dispatch: split a source document, submit one job per page,
//! persist the manifest, relocate the source.
//!
//! Dispatch is strictly sequential in page order. The source document is
//! moved out of the intake bucket only after the manifest write succeeds;
//! if anything fails before that point the original stays where it was and
//! the invocation can simply be retried (page and manifest keys are
//! deterministic, so a retry overwrites rather than duplicates).

use crate::analysis::{standard_queries, DocumentAnalysis, DocumentLocation};
use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::model::{JobRecord, Manifest};
use crate::pipeline::split;
use crate::storage::{self, ObjectStore};
use tracing::{debug, info, warn};

/// Dispatch one source document: upload each page, start its analysis
/// job, persist the manifest, then relocate the source out of intake.
///
/// Returns the persisted [`Manifest`]. Fails with
/// [`IntakeError::DispatchError`] if any submission fails; pages already
/// submitted are not retracted.
pub async fn dispatch_document(
    store: &dyn ObjectStore,
    analysis: &dyn DocumentAnalysis,
    config: &IntakeConfig,
    intake_bucket: &str,
    key: &str,
) -> Result<Manifest, IntakeError> {
    info!("processing object: {intake_bucket}/{key}");
    let bytes = store.get(intake_bucket, key).await?;
    let tracking_id = storage::tracking_id_for(key);

    let page_docs = split::split_pages(&bytes)?;
    let queries = standard_queries();
    let mut jobs: Vec<JobRecord> = Vec::with_capacity(page_docs.len());

    for (idx, page) in page_docs.into_iter().enumerate() {
        let page_num = (idx + 1) as u32;
        let page_key = storage::page_key(&tracking_id, key, page_num);

        debug!("uploading page artifact: {page_key}");
        store.put(&config.output_bucket, &page_key, page).await?;

        debug!("starting analysis for: {page_key}");
        let location = DocumentLocation {
            bucket: config.output_bucket.clone(),
            key: page_key,
        };
        let job_id = analysis
            .start_analysis(&location, &queries, true)
            .await
            .map_err(|e| {
                warn!(
                    "submission failed on page {page_num} of '{tracking_id}'; \
                     {} page(s) already dispatched and not retracted",
                    jobs.len()
                );
                IntakeError::DispatchError {
                    page: page_num,
                    detail: e.to_string(),
                }
            })?;

        jobs.push(JobRecord { job_id, page_num });
    }

    let manifest = Manifest {
        tracking_id: tracking_id.clone(),
        filename: key.to_string(),
        jobs,
    };
    let body = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| IntakeError::Internal(format!("manifest serialisation: {e}")))?;
    store
        .put(
            &config.output_bucket,
            &storage::manifest_key(&tracking_id),
            body,
        )
        .await?;

    // Relocate the source only now that the manifest is durably written.
    let destination = storage::source_key(&tracking_id, key);
    debug!("moving source to {}/{destination}", config.output_bucket);
    store
        .copy(intake_bucket, key, &config.output_bucket, &destination)
        .await?;
    store.delete(intake_bucket, key).await?;

    info!(
        "dispatch complete: {} page(s), tracking id '{tracking_id}'",
        manifest.jobs.len()
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, QuerySpec};
    use crate::model::{AnalysisResult, JobStatus};
    use crate::pipeline::split::tests::build_pdf;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fake service that records submissions and optionally fails from a
    /// given page onwards.
    struct RecordingAnalysis {
        submissions: Mutex<Vec<DocumentLocation>>,
        counter: AtomicU32,
        fail_from: Option<u32>,
    }

    impl RecordingAnalysis {
        fn new(fail_from: Option<u32>) -> Self {
            Self {
                submissions: Mutex::new(Vec::new()),
                counter: AtomicU32::new(0),
                fail_from,
            }
        }
    }

    #[async_trait]
    impl DocumentAnalysis for RecordingAnalysis {
        async fn start_analysis(
            &self,
            location: &DocumentLocation,
            queries: &[QuerySpec],
            detect_signatures: bool,
        ) -> Result<String, AnalysisError> {
            assert_eq!(queries.len(), 5);
            assert!(detect_signatures);
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_from.is_some_and(|from| n >= from) {
                return Err(AnalysisError::Service("throttled".into()));
            }
            self.submissions.lock().unwrap().push(location.clone());
            Ok(format!("job-{n}"))
        }

        async fn get_status(&self, _job_id: &str) -> Result<JobStatus, AnalysisError> {
            Ok(JobStatus::Running)
        }

        async fn get_result(&self, _job_id: &str) -> Result<AnalysisResult, AnalysisError> {
            Err(AnalysisError::Service("not terminal".into()))
        }
    }

    async fn seeded_store(key: &str, pdf: Vec<u8>) -> MemoryStore {
        let store = MemoryStore::new();
        store.create_bucket("inbound");
        store.create_bucket("outbound");
        store.put("inbound", key, pdf).await.unwrap();
        store
    }

    fn config() -> IntakeConfig {
        IntakeConfig::builder("outbound").build().unwrap()
    }

    #[tokio::test]
    async fn dispatch_builds_manifest_and_relocates_source() {
        let store = seeded_store("fax_0042.pdf", build_pdf(&["one", "two"])).await;
        let analysis = RecordingAnalysis::new(None);

        let manifest =
            dispatch_document(&store, &analysis, &config(), "inbound", "fax_0042.pdf")
                .await
                .unwrap();

        assert_eq!(manifest.tracking_id, "fax_0042");
        assert_eq!(manifest.jobs.len(), 2);
        assert_eq!(manifest.jobs[0].page_num, 1);
        assert_eq!(manifest.jobs[1].page_num, 2);

        // Pages uploaded under deterministic keys, in page order.
        let submitted = analysis.submissions.lock().unwrap().clone();
        assert_eq!(submitted[0].key, "fax_0042/fax_0042_page_001.pdf");
        assert_eq!(submitted[1].key, "fax_0042/fax_0042_page_002.pdf");

        // Manifest persisted and source relocated out of intake.
        let stored: Manifest = serde_json::from_slice(
            &store.get("outbound", "fax_0042/jobs.json").await.unwrap(),
        )
        .unwrap();
        assert_eq!(stored, manifest);
        assert!(store.get("inbound", "fax_0042.pdf").await.is_err());
        assert!(store
            .get("outbound", "fax_0042/fax_0042.pdf")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn failed_submission_is_dispatch_error_and_source_stays() {
        let store =
            seeded_store("fax_0042.pdf", build_pdf(&["one", "two", "three"])).await;
        let analysis = RecordingAnalysis::new(Some(2));

        let err = dispatch_document(&store, &analysis, &config(), "inbound", "fax_0042.pdf")
            .await
            .unwrap_err();
        match err {
            IntakeError::DispatchError { page, .. } => assert_eq!(page, 2),
            other => panic!("expected DispatchError, got {other:?}"),
        }

        // No manifest was written and the source never left intake.
        assert!(store.get("outbound", "fax_0042/jobs.json").await.is_err());
        assert!(store.get("inbound", "fax_0042.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn malformed_source_never_reaches_the_service() {
        let store = seeded_store("bad.pdf", b"not a pdf".to_vec()).await;
        let analysis = RecordingAnalysis::new(None);

        let err = dispatch_document(&store, &analysis, &config(), "inbound", "bad.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::MalformedDocument { .. }));
        assert!(analysis.submissions.lock().unwrap().is_empty());
    }
}
