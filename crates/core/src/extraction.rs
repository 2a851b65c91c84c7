//! Per-source extraction of classification views.
//!
//! Walks one source's frame-indexed label data and produces one
//! [`ClassificationView`] per distinct canonical answer the source applied.
//! Canonicalization runs once per classification hash through a per-call
//! cache that is discarded when extraction returns; no state survives
//! between calls.

use std::collections::HashMap;

use serde::Serialize;

use crate::answer::{canonicalize_classification, Answer, Canonicalization, SkipReason};
use crate::error::CoreError;
use crate::label_row::LabelRow;
use crate::ontology::OntologyIndex;
use crate::types::FrameIndex;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The frames at which one source applied one canonical answer.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationView {
    pub answer: Answer,
    /// Sorted, de-duplicated frame indices.
    pub frames: Vec<FrameIndex>,
    /// Identifier of the contributing source (annotation project hash).
    pub source: String,
}

/// A recovered data-quality problem: the offending classification was
/// excluded from consensus and the pass continued.
#[derive(Debug, Clone, Serialize)]
pub struct DataQualityWarning {
    pub source: String,
    pub classification_hash: String,
    pub reason: SkipReason,
}

/// Result of extracting one source's label row.
#[derive(Debug)]
pub struct SourceExtraction {
    /// One view per distinct canonical answer, in first-seen order.
    pub views: Vec<ClassificationView>,
    pub warnings: Vec<DataQualityWarning>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract all classification views from one source's label row.
///
/// Malformed frame keys and classification hashes missing from the side
/// table abort the pass; partial extraction would silently corrupt
/// cross-source matching. Unsupported answer shapes are skipped with a
/// warning instead.
pub fn extract_views(
    source: &str,
    row: &LabelRow,
    index: &OntologyIndex,
) -> Result<SourceExtraction, CoreError> {
    let unit = row.unit()?;

    // Parse every frame key up front so a malformed key fails the pass
    // before any view is assembled, then process in frame order.
    let mut frames = Vec::with_capacity(unit.labels.len());
    for (key, labels) in &unit.labels {
        let frame: FrameIndex = key.trim().parse().map_err(|_| {
            CoreError::Validation(format!(
                "source '{source}': frame key '{key}' is not a valid frame index"
            ))
        })?;
        frames.push((frame, labels));
    }
    frames.sort_by_key(|(frame, _)| *frame);

    // classification hash -> canonical key, or None once skipped.
    let mut cache: HashMap<String, Option<String>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut answers: HashMap<String, Answer> = HashMap::new();
    let mut frames_by_answer: HashMap<String, Vec<FrameIndex>> = HashMap::new();
    let mut warnings = Vec::new();

    for (frame, labels) in frames {
        for entry in &labels.classifications {
            let cached = match cache.get(&entry.classification_hash) {
                Some(resolved) => resolved.clone(),
                None => {
                    let answer_entry = row
                        .classification_answers
                        .get(&entry.classification_hash)
                        .ok_or_else(|| {
                            CoreError::Validation(format!(
                                "source '{source}': no classification answer recorded for hash '{}'",
                                entry.classification_hash
                            ))
                        })?;

                    let resolved =
                        match canonicalize_classification(entry, answer_entry, index)? {
                            Canonicalization::Answer(answer) => {
                                let fq_name = answer.fq_name.clone();
                                if !answers.contains_key(&fq_name) {
                                    order.push(fq_name.clone());
                                    answers.insert(fq_name.clone(), answer);
                                }
                                Some(fq_name)
                            }
                            Canonicalization::Skipped(reason) => {
                                tracing::warn!(
                                    source = %source,
                                    classification_hash = %entry.classification_hash,
                                    reason = %reason,
                                    "Skipping classification unsupported for consensus"
                                );
                                warnings.push(DataQualityWarning {
                                    source: source.to_string(),
                                    classification_hash: entry.classification_hash.clone(),
                                    reason,
                                });
                                None
                            }
                        };
                    cache.insert(entry.classification_hash.clone(), resolved.clone());
                    resolved
                }
            };

            if let Some(fq_name) = cached {
                frames_by_answer.entry(fq_name).or_default().push(frame);
            }
        }
    }

    let views = order
        .into_iter()
        .filter_map(|fq_name| {
            let answer = answers.remove(&fq_name)?;
            let mut view_frames = frames_by_answer.remove(&fq_name).unwrap_or_default();
            view_frames.sort_unstable();
            view_frames.dedup();
            Some(ClassificationView {
                answer,
                frames: view_frames,
                source: source.to_string(),
            })
        })
        .collect();

    Ok(SourceExtraction { views, warnings })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
