//! Error types for the rfs-intake library.
//!
//! One enum, [`IntakeError`], covers every fatal failure an invocation can
//! hit. Variants map 1:1 onto the pipeline's failure taxonomy:
//!
//! * [`IntakeError::MalformedDocument`] — the input could not be split into
//!   pages; the invocation aborts before anything is dispatched.
//! * [`IntakeError::DispatchError`] — a per-page submission failed; pages
//!   dispatched before the failure are not retracted.
//! * [`IntakeError::ManifestNotFound`] — retrieval was attempted for a
//!   tracking id with no persisted manifest (404-equivalent).
//! * [`IntakeError::ProcessingTimeout`] — the poll retry budget ran out
//!   with jobs still non-terminal (500-equivalent, distinct from a job
//!   reaching FAILED).
//! * [`IntakeError::AnalysisFailed`] — a job reached FAILED and the result
//!   assembler refused to emit a partial record.
//!
//! Storage and analysis-service errors from external collaborators are
//! wrapped, logged at the invocation boundary, and re-raised — never
//! suppressed locally. The only logged-and-swallowed path in the whole
//! crate is notification delivery ([`crate::notify`]).

use crate::analysis::AnalysisError;
use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// All fatal errors returned by the rfs-intake library.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The input byte stream could not be parsed as a sequence of pages.
    #[error("malformed document: {detail}")]
    MalformedDocument { detail: String },

    /// An individual page submission to the analysis service failed.
    ///
    /// Pages submitted before this one remain dispatched; re-invoking the
    /// same document overwrites them (keys are deterministic).
    #[error("dispatch failed on page {page}: {detail}")]
    DispatchError { page: u32, detail: String },

    /// No manifest is persisted for this tracking id.
    #[error("no job manifest found for tracking id '{tracking_id}'")]
    ManifestNotFound { tracking_id: String },

    /// The retry budget was exhausted with jobs still non-terminal.
    #[error("processing not completed after {attempts} poll attempts for tracking id '{tracking_id}'")]
    ProcessingTimeout { tracking_id: String, attempts: u32 },

    /// A job reached FAILED; no partial record is emitted for the document.
    #[error("analysis job '{job_id}' for page {page_num} of '{tracking_id}' failed")]
    AnalysisFailed {
        tracking_id: String,
        page_num: u32,
        job_id: String,
    },

    /// Object-storage collaborator error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Document-analysis collaborator error outside of dispatch.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Configuration was invalid at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    /// HTTP-equivalent status code for this failure.
    ///
    /// `ManifestNotFound` surfaces as 404, `MalformedDocument` as 400;
    /// everything else (timeouts, failed jobs, collaborator errors) is a
    /// 500-class failure of the invocation itself.
    pub fn status_code(&self) -> u16 {
        match self {
            IntakeError::MalformedDocument { .. } => 400,
            IntakeError::ManifestNotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Build the user-visible structured failure body.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
        }
    }
}

/// Structured error payload surfaced to callers, `{"ERROR": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    #[serde(rename = "ERROR")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_not_found_is_404() {
        let e = IntakeError::ManifestNotFound {
            tracking_id: "fax_0042".into(),
        };
        assert_eq!(e.status_code(), 404);
        assert!(e.to_string().contains("fax_0042"));
    }

    #[test]
    fn timeout_is_500_and_names_the_budget() {
        let e = IntakeError::ProcessingTimeout {
            tracking_id: "fax_0042".into(),
            attempts: 60,
        };
        assert_eq!(e.status_code(), 500);
        assert!(e.to_string().contains("60"));
    }

    #[test]
    fn malformed_document_is_400() {
        let e = IntakeError::MalformedDocument {
            detail: "not a PDF".into(),
        };
        assert_eq!(e.status_code(), 400);
    }

    #[test]
    fn payload_uses_upper_case_error_key() {
        let e = IntakeError::DispatchError {
            page: 3,
            detail: "service unavailable".into(),
        };
        let json = serde_json::to_value(e.to_payload()).unwrap();
        assert!(json.get("ERROR").is_some());
        assert!(json["ERROR"].as_str().unwrap().contains("page 3"));
    }
}
