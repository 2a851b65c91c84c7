//! Typed mirror of the annotation platform's label-row document.
//!
//! One label row per (source project, media item): header metadata, the
//! frame-indexed `labels` map inside `data_units`, and the
//! `classification_answers` side table holding the full answer payload per
//! classification hash. Unknown platform fields round-trip untouched
//! through flattened maps so an exported document stays importable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Supported data types
// ---------------------------------------------------------------------------

/// Video media item; labels are keyed by frame number.
pub const DATA_TYPE_VIDEO: &str = "video";

/// Single-image media item; labels live under a single frame key.
pub const DATA_TYPE_IMAGE: &str = "image";

/// Media types consensus review can run on.
pub const SUPPORTED_DATA_TYPES: &[&str] = &[DATA_TYPE_VIDEO, DATA_TYPE_IMAGE];

// ---------------------------------------------------------------------------
// Document structure
// ---------------------------------------------------------------------------

/// A single source's label row for one media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRow {
    #[serde(default)]
    pub label_hash: String,
    pub dataset_hash: String,
    #[serde(default)]
    pub dataset_title: String,
    #[serde(default)]
    pub data_title: String,
    pub data_hash: String,
    pub data_type: String,
    /// Data units keyed by data hash; exactly one entry matters per row.
    #[serde(default)]
    pub data_units: BTreeMap<String, DataUnit>,
    /// Side table: classification hash -> full answer payload.
    #[serde(default)]
    pub classification_answers: BTreeMap<String, ClassificationAnswer>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LabelRow {
    /// The data unit this row labels, addressed by the row's own data hash.
    pub fn unit(&self) -> Result<&DataUnit, CoreError> {
        self.data_units.get(&self.data_hash).ok_or_else(|| {
            CoreError::Validation(format!(
                "label row '{}' has no data unit for data hash '{}'",
                self.label_hash, self.data_hash
            ))
        })
    }
}

/// One media unit inside a label row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataUnit {
    pub data_hash: String,
    #[serde(default)]
    pub data_title: String,
    /// MIME-style unit type (e.g. `video/mp4`), distinct from the row's
    /// `data_type`.
    #[serde(default)]
    pub data_type: String,
    /// String frame keys -> per-frame label entries.
    #[serde(default)]
    pub labels: BTreeMap<String, FrameLabels>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The labels recorded on one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameLabels {
    #[serde(default)]
    pub classifications: Vec<FrameClassification>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A classification instance applied on a frame. The actual chosen answers
/// live in the row's `classification_answers` side table under
/// `classification_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameClassification {
    pub classification_hash: String,
    /// Feature hash of the ontology classification attribute.
    pub feature_hash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Side-table entry: the recorded answers for one classification instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationAnswer {
    #[serde(default)]
    pub classification_hash: String,
    /// One part per (possibly nested) question answered.
    #[serde(default)]
    pub classifications: Vec<AnswerPart>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One answered question within a classification instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPart {
    #[serde(default)]
    pub name: String,
    /// Machine-readable question value, used as the question side of an
    /// `fq_part`.
    #[serde(default)]
    pub value: String,
    /// Feature hash of the question node inside the attribute subtree.
    pub feature_hash: String,
    /// Recorded answer options. Consensus supports exactly one.
    #[serde(default)]
    pub answers: Vec<AnswerValue>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single chosen answer option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerValue {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub feature_hash: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Source compatibility validation
// ---------------------------------------------------------------------------

/// Validate that a set of selected sources can enter one consensus pass.
///
/// All rows must reference the same media item (data hash) from the same
/// dataset, the media type must be supported, and every row must actually
/// carry a data unit for the shared item.
pub fn validate_source_compatibility(sources: &[(String, LabelRow)]) -> Result<(), CoreError> {
    let (_, reference) = sources.first().ok_or_else(|| {
        CoreError::Validation("at least one source must be selected for consensus".to_string())
    })?;

    if !SUPPORTED_DATA_TYPES.contains(&reference.data_type.as_str()) {
        return Err(CoreError::Validation(format!(
            "data type '{}' is not supported for consensus. Must be one of: {}",
            reference.data_type,
            SUPPORTED_DATA_TYPES.join(", ")
        )));
    }

    for (source, row) in sources {
        if row.data_hash != reference.data_hash {
            return Err(CoreError::Validation(format!(
                "source '{source}' labels data hash '{}' but the selection targets '{}'",
                row.data_hash, reference.data_hash
            )));
        }
        if row.dataset_hash != reference.dataset_hash {
            return Err(CoreError::Validation(format!(
                "source '{source}' belongs to dataset '{}' but the selection targets '{}'",
                row.dataset_hash, reference.dataset_hash
            )));
        }
        row.unit()?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
