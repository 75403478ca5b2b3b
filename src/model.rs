//! Data model: the analysis-service block subset, the persisted job
//! manifest, and the public result record.
//!
//! Two families of types live here and must not be confused:
//!
//! * **Internal/wire types** ([`Block`], [`AnalysisResult`], [`Manifest`]) —
//!   mirror what the external document-analysis service and the persisted
//!   `jobs.json` actually say, with their original field names
//!   (`JobId`, `PageNum`, `BlockType`, …).
//!
//! * **Public record types** ([`ResultRecord`], [`PageRecord`], [`Entity`]) —
//!   the canonical downstream vocabulary (`entity`, `value`, `query`,
//!   `confidence`, `page_id`, `page_num`). These are built once by a pure
//!   transform in [`crate::pipeline::assemble`] and never mutated in place;
//!   internal identifiers (query/answer block ids, job linkage) do not
//!   appear in them.

use serde::{Deserialize, Serialize};

// ── Analysis-service block model ─────────────────────────────────────────

/// Type tag of one block in an analysis result.
///
/// Only the four types the pipeline consumes are distinguished; anything
/// else the service emits deserialises as [`BlockType::Other`] and is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Query,
    QueryResult,
    Line,
    Signature,
    #[serde(other)]
    Other,
}

/// Cross-reference from one block to others, by block identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Edge type. The pipeline only follows `"ANSWER"` edges.
    #[serde(rename = "Type")]
    pub rel_type: String,
    /// Target block identifiers.
    #[serde(rename = "Ids")]
    pub ids: Vec<String>,
}

/// Echo of the submitted query carried on a QUERY block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEcho {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Alias")]
    pub alias: String,
}

/// One typed unit in an analysis result.
///
/// Fields are optional because different block types populate different
/// subsets: LINE and QUERY_RESULT carry `text`, QUERY carries `query`,
/// SIGNATURE and QUERY_RESULT carry `confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "BlockType")]
    pub block_type: BlockType,
    #[serde(rename = "Text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "Confidence", default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(rename = "Query", default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryEcho>,
    #[serde(rename = "Relationships", default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
}

impl Block {
    /// Identifier of the block this QUERY's `ANSWER` edge points at, if any.
    pub fn answer_id(&self) -> Option<&str> {
        self.relationships
            .iter()
            .find(|r| r.rel_type == "ANSWER")
            .and_then(|r| r.ids.first())
            .map(String::as_str)
    }
}

/// Lifecycle status of one analysis job.
///
/// Jobs transition `Running → {Succeeded, Failed}` exactly once and never
/// regress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Terminal statuses are `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// The subset of a job's raw result this pipeline consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "JobStatus")]
    pub job_status: JobStatus,
    #[serde(rename = "Blocks", default)]
    pub blocks: Vec<Block>,
}

// ── Job manifest (`jobs.json`) ───────────────────────────────────────────

/// One dispatched analysis job, tagged with its 1-based page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "JobId")]
    pub job_id: String,
    #[serde(rename = "PageNum")]
    pub page_num: u32,
}

/// Persisted ordered list of per-page jobs for one document.
///
/// Written once at dispatch time; its length equals the document's page
/// count and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub tracking_id: String,
    pub filename: String,
    pub jobs: Vec<JobRecord>,
}

// ── Public result record (`entities.json`) ───────────────────────────────

/// Heuristic page-type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    #[serde(rename = "blank")]
    Blank,
    #[serde(rename = "RFS")]
    Rfs,
    #[serde(rename = "other")]
    Other,
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageType::Blank => write!(f, "blank"),
            PageType::Rfs => write!(f, "RFS"),
            PageType::Other => write!(f, "other"),
        }
    }
}

/// Answer value of an entity.
///
/// Query answers are text; the synthetic `SIGNATURE` entity carries the
/// boolean signed verdict. Serialised untagged, so the JSON value is a
/// plain string or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Signed(bool),
    Text(String),
}

/// A resolved (question, answer, confidence) triple.
///
/// `value` and `confidence` are `null` when no ANSWER edge resolved for
/// the query on this page — an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    pub value: Option<EntityValue>,
    pub query: String,
    pub confidence: Option<f64>,
}

/// Per-page summary in the final record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_id: String,
    pub page_num: u32,
    pub page_type: PageType,
    /// Sorted by ascending `entity` alias; the sort is stable and is
    /// re-applied after the synthetic SIGNATURE entity is appended.
    pub entities: Vec<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_confidence: Option<f64>,
}

/// The final artifact for one document.
///
/// Field declaration order fixes the serialised key order:
/// tracking id, filename, pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub tracking_id: String,
    pub filename: String,
    pub pages: Vec<PageRecord>,
}
