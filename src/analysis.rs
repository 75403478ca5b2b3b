//! Document-analysis service seam and the fixed query set.
//!
//! The external OCR + structured-query service is reached only through the
//! [`DocumentAnalysis`] trait: start a job against a stored page artifact,
//! poll its status, fetch its block-level result. The pipeline depends on
//! nothing else about the service's wire format beyond the subset captured
//! in [`crate::model::AnalysisResult`].

use crate::model::{AnalysisResult, JobStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the analysis collaborator.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis service error: {0}")]
    Service(String),
    #[error("unknown analysis job: {0}")]
    UnknownJob(String),
}

/// Location of a stored page artifact the service should analyse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLocation {
    pub bucket: String,
    pub key: String,
}

/// One structured query submitted with every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Alias")]
    pub alias: String,
}

impl QuerySpec {
    pub fn new(text: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alias: alias.into(),
        }
    }
}

/// The fixed five-question query set dispatched with every page.
///
/// Aliases and question texts are part of the output contract: entity
/// aliases in the final record come from here and are never invented by
/// the parser.
pub fn standard_queries() -> Vec<QuerySpec> {
    vec![
        QuerySpec::new("What is the patient's or veteran's name?", "PATIENT_NAME"),
        QuerySpec::new(
            "What is the patient's or veteran's date of birth?",
            "PATIENT_DOB",
        ),
        QuerySpec::new(
            "What is the ordering provider's or doctor's name?",
            "PROVIDER_NAME",
        ),
        QuerySpec::new("What is the date in the fax header?", "FAX_DATE"),
        QuerySpec::new(
            "What is the visit, procedure, or service date?",
            "SERVICE_DATE",
        ),
    ]
}

/// Narrow interface over the external document-analysis service.
#[async_trait]
pub trait DocumentAnalysis: Send + Sync {
    /// Submit an asynchronous analysis job for one stored page.
    ///
    /// Returns the service-assigned opaque job identifier. The job starts
    /// in `RUNNING` state and completes on the service's own schedule.
    async fn start_analysis(
        &self,
        location: &DocumentLocation,
        queries: &[QuerySpec],
        detect_signatures: bool,
    ) -> Result<String, AnalysisError>;

    /// Current lifecycle status of a job.
    async fn get_status(&self, job_id: &str) -> Result<JobStatus, AnalysisError>;

    /// Raw block-level result of a job. Only meaningful once the job is
    /// terminal.
    async fn get_result(&self, job_id: &str) -> Result<AnalysisResult, AnalysisError>;
}
