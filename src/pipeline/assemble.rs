//! Result assembly: merge parser, classifier, and signature outputs into
//! the canonical document record.
//!
//! Assembly is a pure transform from internal raw results to the public
//! record vocabulary — internal block identifiers and job linkage are
//! dropped, nothing is mutated in place, and running it twice over the
//! same terminal results yields byte-identical output. Entities within a
//! page are sorted by ascending alias with a stable sort that is
//! re-applied after the synthetic SIGNATURE entity is appended, so the
//! final ordering is a function of alias strings alone.

use crate::analysis::DocumentAnalysis;
use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::model::{
    AnalysisResult, Entity, EntityValue, JobRecord, JobStatus, Manifest, PageRecord, PageType,
    ResultRecord,
};
use crate::pipeline::extract::{self, RawEntity, SIGNATURE_QUERY};
use crate::storage::{self, ObjectStore};
use tracing::{debug, info};

impl From<RawEntity> for Entity {
    fn from(raw: RawEntity) -> Self {
        Entity {
            entity: raw.alias,
            value: raw.answer_text.map(EntityValue::Text),
            query: raw.query_text,
            confidence: raw.confidence,
        }
    }
}

/// Build the public summary of one page from its terminal job result.
///
/// For RFS pages the synthetic SIGNATURE entity is appended and the alias
/// sort re-applied; a missing SIGNATURE block means "no signature
/// detected" (verdict false, null confidence), not an error.
pub fn page_record(job: &JobRecord, result: &AnalysisResult, config: &IntakeConfig) -> PageRecord {
    let text = extract::page_text(result);
    let page_type = extract::classify_page(&text, config.blank_page_threshold);
    debug!("page {} classified as {page_type}", job.page_num);

    let mut entities: Vec<Entity> = extract::parse_entities(result)
        .into_iter()
        .map(Entity::from)
        .collect();
    entities.sort_by(|a, b| a.entity.cmp(&b.entity));

    let mut signature = None;
    if page_type == PageType::Rfs {
        signature = extract::signature_confidence(result);
        let signed = signature.is_some_and(|c| c >= config.signature_threshold);
        entities.push(Entity {
            entity: "SIGNATURE".into(),
            value: Some(EntityValue::Signed(signed)),
            query: SIGNATURE_QUERY.into(),
            confidence: signature,
        });
        entities.sort_by(|a, b| a.entity.cmp(&b.entity));
    }

    PageRecord {
        page_id: job.job_id.clone(),
        page_num: job.page_num,
        page_type,
        entities,
        signature_confidence: signature,
    }
}

/// Assemble the result record for a fully-terminal manifest, persist it at
/// the entities key, and return it.
///
/// A job whose terminal status is FAILED aborts the whole document with
/// [`IntakeError::AnalysisFailed`]; no partial record is written.
pub async fn assemble_record(
    store: &dyn ObjectStore,
    analysis: &dyn DocumentAnalysis,
    config: &IntakeConfig,
    manifest: &Manifest,
) -> Result<ResultRecord, IntakeError> {
    let mut pages = Vec::with_capacity(manifest.jobs.len());
    for job in &manifest.jobs {
        let result = analysis.get_result(&job.job_id).await?;
        if result.job_status == JobStatus::Failed {
            return Err(IntakeError::AnalysisFailed {
                tracking_id: manifest.tracking_id.clone(),
                page_num: job.page_num,
                job_id: job.job_id.clone(),
            });
        }
        pages.push(page_record(job, &result, config));
    }

    let record = ResultRecord {
        tracking_id: manifest.tracking_id.clone(),
        filename: manifest.filename.clone(),
        pages,
    };

    let body = serde_json::to_vec_pretty(&record)
        .map_err(|e| IntakeError::Internal(format!("record serialisation: {e}")))?;
    store
        .put(
            &config.output_bucket,
            &storage::entities_key(&manifest.tracking_id),
            body,
        )
        .await?;
    info!(
        "entities record written for tracking id '{}' ({} pages)",
        manifest.tracking_id,
        record.pages.len()
    );

    Ok(record)
}
