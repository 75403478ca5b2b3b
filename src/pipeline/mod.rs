//! Pipeline stages for document intake and entity extraction.
//!
//! Each submodule implements exactly one transformation step, keeping the
//! stages independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! split ──▶ dispatch ──▶ poll ──▶ extract ──▶ assemble
//! (pages)   (jobs +      (wait    (entities,  (record)
//!            manifest)    all      page type,
//!                         done)    signature)
//! ```
//!
//! 1. [`split`]    — break the source document into single-page documents
//! 2. [`dispatch`] — upload pages, start one analysis job each, persist
//!    the manifest, relocate the source
//! 3. [`poll`]     — bounded fixed-interval wait until every job is
//!    terminal
//! 4. [`extract`]  — pure per-page functions: answer-graph resolution,
//!    page classification, signature confidence
//! 5. [`assemble`] — merge per-page outputs into the canonical record and
//!    persist it

pub mod assemble;
pub mod dispatch;
pub mod extract;
pub mod poll;
pub mod split;
