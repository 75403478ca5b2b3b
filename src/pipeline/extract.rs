//! Per-page extraction: answer-graph parsing, page classification, and
//! signature evaluation.
//!
//! Everything here is a pure function over one job's raw result. The
//! parser resolves the QUERY → QUERY_RESULT graph in two passes; the
//! classifier and signature evaluator scan block text and confidence.
//! None of these functions can fail: a query without an answer and an RFS
//! page without a signature block are defined absences, not errors.

use crate::model::{AnalysisResult, BlockType, PageType};

/// The form-number substring identifying the signable RFS form.
pub const RFS_FORM_NUMBER: &str = "10-10172";

/// Query text attached to the synthetic SIGNATURE entity.
pub const SIGNATURE_QUERY: &str = "Is the RFS signed?";

/// One resolved query, still carrying the internal block identifiers used
/// during graph resolution. Converted to the public
/// [`crate::model::Entity`] vocabulary by the result assembler, which
/// drops `query_id` and `answer_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub alias: String,
    pub query_id: String,
    pub query_text: String,
    pub answer_id: Option<String>,
    pub answer_text: Option<String>,
    pub confidence: Option<f64>,
}

/// Round a confidence value to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Resolve the query→answer graph of one result into raw entities.
///
/// Pass 1 records every QUERY block (alias, text, own id, ANSWER-edge
/// target). Pass 2 fills in answer text and rounded confidence from the
/// QUERY_RESULT blocks those targets name. Queries whose edge is missing
/// or dangling keep `None` answer fields — a query may legitimately have
/// no answer on a given page.
pub fn parse_entities(result: &AnalysisResult) -> Vec<RawEntity> {
    let mut entities: Vec<RawEntity> = Vec::new();

    for block in &result.blocks {
        if block.block_type != BlockType::Query {
            continue;
        }
        let Some(query) = &block.query else { continue };
        entities.push(RawEntity {
            alias: query.alias.clone(),
            query_id: block.id.clone(),
            query_text: query.text.clone(),
            answer_id: block.answer_id().map(str::to_string),
            answer_text: None,
            confidence: None,
        });
    }

    for block in &result.blocks {
        if block.block_type != BlockType::QueryResult {
            continue;
        }
        for entity in entities
            .iter_mut()
            .filter(|e| e.answer_id.as_deref() == Some(block.id.as_str()))
        {
            entity.answer_text = block.text.clone();
            entity.confidence = block.confidence.map(round2);
        }
    }

    entities
}

/// Concatenate all recognised LINE text in block order, space-joined.
pub fn page_text(result: &AnalysisResult) -> String {
    let mut text = String::new();
    for block in &result.blocks {
        if block.block_type != BlockType::Line {
            continue;
        }
        if let Some(line) = &block.text {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(line.trim());
        }
    }
    text
}

/// Classify a page from its combined recognised text.
///
/// Below `blank_page_threshold` words → blank; containing the RFS form
/// number → RFS; otherwise other. The word-count boundary is exclusive:
/// exactly `blank_page_threshold` words is not blank.
pub fn classify_page(text: &str, blank_page_threshold: usize) -> PageType {
    if text.split_whitespace().count() < blank_page_threshold {
        PageType::Blank
    } else if text.contains(RFS_FORM_NUMBER) {
        PageType::Rfs
    } else {
        PageType::Other
    }
}

/// Confidence of the first SIGNATURE block in the result, rounded to two
/// decimals. `None` means no signature was detected on the page.
pub fn signature_confidence(result: &AnalysisResult) -> Option<f64> {
    result
        .blocks
        .iter()
        .find(|b| b.block_type == BlockType::Signature)
        .and_then(|b| b.confidence)
        .map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, JobStatus, QueryEcho, Relationship};

    fn query_block(id: &str, alias: &str, answer_id: Option<&str>) -> Block {
        Block {
            id: id.into(),
            block_type: BlockType::Query,
            text: None,
            confidence: None,
            query: Some(QueryEcho {
                text: format!("What is the {}?", alias.to_lowercase()),
                alias: alias.into(),
            }),
            relationships: answer_id
                .map(|a| {
                    vec![Relationship {
                        rel_type: "ANSWER".into(),
                        ids: vec![a.into()],
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn result_block(id: &str, text: &str, confidence: f64) -> Block {
        Block {
            id: id.into(),
            block_type: BlockType::QueryResult,
            text: Some(text.into()),
            confidence: Some(confidence),
            query: None,
            relationships: vec![],
        }
    }

    fn line_block(id: &str, text: &str) -> Block {
        Block {
            id: id.into(),
            block_type: BlockType::Line,
            text: Some(text.into()),
            confidence: Some(99.0),
            query: None,
            relationships: vec![],
        }
    }

    fn signature_block(id: &str, confidence: f64) -> Block {
        Block {
            id: id.into(),
            block_type: BlockType::Signature,
            text: None,
            confidence: Some(confidence),
            query: None,
            relationships: vec![],
        }
    }

    fn result(blocks: Vec<Block>) -> AnalysisResult {
        AnalysisResult {
            job_status: JobStatus::Succeeded,
            blocks,
        }
    }

    #[test]
    fn resolved_answer_is_rounded_to_two_decimals() {
        let r = result(vec![
            query_block("q1", "X", Some("a1")),
            result_block("a1", "T", 91.236),
        ]);
        let entities = parse_entities(&r);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].alias, "X");
        assert_eq!(entities[0].answer_text.as_deref(), Some("T"));
        assert_eq!(entities[0].confidence, Some(91.24));
    }

    #[test]
    fn dangling_answer_edge_yields_nulls() {
        let r = result(vec![query_block("q1", "PATIENT_NAME", Some("missing"))]);
        let entities = parse_entities(&r);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].answer_text, None);
        assert_eq!(entities[0].confidence, None);
    }

    #[test]
    fn query_without_answer_edge_yields_nulls() {
        let r = result(vec![query_block("q1", "FAX_DATE", None)]);
        let entities = parse_entities(&r);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].answer_id, None);
        assert_eq!(entities[0].answer_text, None);
        assert_eq!(entities[0].confidence, None);
    }

    #[test]
    fn one_entity_per_query_block() {
        let r = result(vec![
            query_block("q1", "PATIENT_NAME", Some("a1")),
            query_block("q2", "PATIENT_DOB", None),
            result_block("a1", "JOHN DOE", 88.0),
            line_block("l1", "irrelevant"),
        ]);
        let entities = parse_entities(&r);
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn page_text_joins_lines_in_block_order() {
        let r = result(vec![
            line_block("l1", "first line"),
            signature_block("s1", 70.0),
            line_block("l2", "second line"),
        ]);
        assert_eq!(page_text(&r), "first line second line");
    }

    #[test]
    fn classify_below_threshold_is_blank() {
        let nineteen = vec!["w"; 19].join(" ");
        assert_eq!(classify_page(&nineteen, 20), PageType::Blank);
    }

    #[test]
    fn classify_threshold_boundary_is_not_blank() {
        let twenty = vec!["w"; 20].join(" ");
        assert_eq!(classify_page(&twenty, 20), PageType::Other);
    }

    #[test]
    fn classify_form_number_is_rfs() {
        let mut words = vec!["w"; 24];
        words.push(RFS_FORM_NUMBER);
        let text = words.join(" ");
        assert_eq!(classify_page(&text, 20), PageType::Rfs);
    }

    #[test]
    fn classify_without_form_number_is_other() {
        let text = vec!["w"; 25].join(" ");
        assert_eq!(classify_page(&text, 20), PageType::Other);
    }

    #[test]
    fn sparse_rfs_page_is_still_blank() {
        // Word count wins over the form-number check.
        assert_eq!(classify_page(RFS_FORM_NUMBER, 20), PageType::Blank);
    }

    #[test]
    fn signature_confidence_is_rounded() {
        let r = result(vec![line_block("l1", "x"), signature_block("s1", 49.994)]);
        assert_eq!(signature_confidence(&r), Some(49.99));
    }

    #[test]
    fn absent_signature_is_none() {
        let r = result(vec![line_block("l1", "x")]);
        assert_eq!(signature_confidence(&r), None);
    }
}
