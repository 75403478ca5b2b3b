//! # rfs-intake
//!
//! Document-intake pipeline: incoming PDF forms are split into pages,
//! each page is submitted to an external document-analysis (OCR +
//! structured-query) service, jobs are polled to completion, and
//! structured entities — named answers to a fixed question set, a page
//! classification, and a signed/unsigned verdict — are extracted,
//! normalised, and forwarded downstream.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (intake bucket)
//!  │
//!  ├─ 1. Split     one single-page PDF per source page (lopdf, in memory)
//!  ├─ 2. Dispatch  upload each page + start an analysis job (fixed query set)
//!  ├─ 3. Manifest  persist the ordered job list at {tracking_id}/jobs.json
//!  ├─ 4. Poll      bounded fixed-interval wait until every job is terminal
//!  ├─ 5. Extract   answer graph → entities; classify page; evaluate signature
//!  ├─ 6. Assemble  canonical record at {tracking_id}/entities.json
//!  └─ 7. Notify    fire-and-forget POST of the record downstream
//! ```
//!
//! External collaborators — object storage, the analysis service, the
//! notification endpoint — sit behind narrow seams
//! ([`ObjectStore`], [`DocumentAnalysis`], [`Notifier`]) so the pipeline
//! logic runs unchanged against production backends, a local directory
//! tree, or in-memory fakes in tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rfs_intake::{process, FsStore, IntakeConfig, Notifier};
//!
//! # async fn run(analysis: &dyn rfs_intake::DocumentAnalysis) -> Result<(), rfs_intake::IntakeError> {
//! let config = IntakeConfig::builder("outbound-jsons")
//!     .notify_endpoint("https://example.test/entities")
//!     .build()?;
//! let store = FsStore::new("/var/lib/intake");
//! config.validate_store(&store).await?;
//!
//! let notifier = config.notify_endpoint.clone().map(Notifier::new);
//! let record = process(
//!     &store,
//!     analysis,
//!     notifier.as_ref(),
//!     &config,
//!     "inbound-pdfs",
//!     "fax_0042.pdf",
//! )
//! .await?;
//! println!("{} pages extracted", record.pages.len());
//! # Ok(())
//! # }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod error;
pub mod intake;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{standard_queries, AnalysisError, DocumentAnalysis, DocumentLocation, QuerySpec};
pub use config::{IntakeConfig, IntakeConfigBuilder};
pub use error::{ErrorPayload, IntakeError};
pub use intake::{ingest, ingest_all, load_manifest, process, retrieve};
pub use model::{
    AnalysisResult, Block, BlockType, Entity, EntityValue, JobRecord, JobStatus, Manifest,
    PageRecord, PageType, QueryEcho, Relationship, ResultRecord,
};
pub use notify::Notifier;
pub use pipeline::poll::{PollPolicy, PollState};
pub use storage::{FsStore, MemoryStore, ObjectStore, StorageError};
