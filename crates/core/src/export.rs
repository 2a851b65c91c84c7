//! Export projection.
//!
//! Serializes a selected subset of regions into the interchange document
//! the annotation platform imports (also offered as a file download by the
//! surrounding app). Header metadata is copied from one of the source label
//! rows; every included region becomes a classification-answer record under
//! a freshly generated short identifier plus one label entry per frame it
//! spans.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use serde::Serialize;

use crate::error::CoreError;
use crate::label_row::{AnswerPart, LabelRow};
use crate::region::{RegionKey, RegionOfInterest};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of freshly generated record identifiers.
pub const RECORD_ID_LENGTH: usize = 8;

/// `createdAt` format required by the platform importer: fully qualified,
/// fixed GMT offset.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// ---------------------------------------------------------------------------
// Document structure
// ---------------------------------------------------------------------------

/// The consensus export document.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub dataset_hash: String,
    pub dataset_title: String,
    pub data_title: String,
    pub data_hash: String,
    pub data_type: String,
    pub data_units: BTreeMap<String, ExportDataUnit>,
    /// Record id -> canonical classification payload.
    pub classification_answers: BTreeMap<String, ExportClassificationAnswer>,
    /// Record id -> consensus sidecar for downstream review tooling.
    pub consensus_meta: BTreeMap<String, ConsensusMeta>,
}

/// The exported media unit: source metadata with consensus labels.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDataUnit {
    pub data_hash: String,
    pub data_title: String,
    pub data_type: String,
    /// String frame keys -> consensus label entries.
    pub labels: BTreeMap<String, ExportFrameLabels>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Consensus labels on one exported frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportFrameLabels {
    pub classifications: Vec<ExportClassificationEntry>,
}

/// One region's presence on one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportClassificationEntry {
    pub name: String,
    pub value: String,
    pub feature_hash: String,
    /// The region's freshly generated record identifier.
    pub classification_hash: String,
    /// Sources voting this answer on this frame, in vote order.
    pub vote_project_hashes: Vec<String>,
    pub vote_count: usize,
    pub created_at: String,
}

/// The canonical answer payload for one exported region.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportClassificationAnswer {
    pub classification_hash: String,
    pub classifications: Vec<AnswerPart>,
    pub created_at: String,
}

/// Consensus statistics recorded alongside each exported region.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusMeta {
    pub score: f64,
    pub answer_fq_name: String,
    pub region_number: usize,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project the selected regions into an export document.
///
/// Only regions whose [`RegionKey`] is in `include` are emitted; an empty
/// selection produces a document with no label or classification entries.
/// Header metadata comes from the first source row (all rows label the
/// same media item, validated upstream). Inputs are not mutated.
pub fn export_regions_of_interest(
    regions: &[RegionOfInterest],
    sources: &[(String, LabelRow)],
    include: &HashSet<RegionKey>,
    exported_at: Timestamp,
) -> Result<ExportDocument, CoreError> {
    let (_, first_row) = sources.first().ok_or_else(|| {
        CoreError::Validation(
            "cannot export without at least one source label row".to_string(),
        )
    })?;
    let unit = first_row.unit()?;

    let created_at = exported_at.format(EXPORT_TIMESTAMP_FORMAT).to_string();

    let mut export_unit = ExportDataUnit {
        data_hash: unit.data_hash.clone(),
        data_title: unit.data_title.clone(),
        data_type: unit.data_type.clone(),
        labels: BTreeMap::new(),
        extra: unit.extra.clone(),
    };
    let mut classification_answers = BTreeMap::new();
    let mut consensus_meta = BTreeMap::new();

    let mut used_ids: HashSet<String> = HashSet::new();
    for region in regions.iter().filter(|r| include.contains(&r.key())) {
        let record_id = generate_record_id(&mut used_ids);

        classification_answers.insert(
            record_id.clone(),
            ExportClassificationAnswer {
                classification_hash: record_id.clone(),
                classifications: region.answer.payload.clone(),
                created_at: created_at.clone(),
            },
        );
        consensus_meta.insert(
            record_id.clone(),
            ConsensusMeta {
                score: region.consensus_data.integrated_agreement_score,
                answer_fq_name: region.answer.fq_name.clone(),
                region_number: region.region_number,
            },
        );

        for (frame, votes) in &region.frame_votes {
            export_unit
                .labels
                .entry(frame.to_string())
                .or_default()
                .classifications
                .push(ExportClassificationEntry {
                    name: region.answer.name.clone(),
                    value: region.answer.value.clone(),
                    feature_hash: region.answer.feature_hash.clone(),
                    classification_hash: record_id.clone(),
                    vote_project_hashes: votes.clone(),
                    vote_count: votes.len(),
                    created_at: created_at.clone(),
                });
        }
    }

    Ok(ExportDocument {
        dataset_hash: first_row.dataset_hash.clone(),
        dataset_title: first_row.dataset_title.clone(),
        data_title: first_row.data_title.clone(),
        data_hash: first_row.data_hash.clone(),
        data_type: first_row.data_type.clone(),
        data_units: BTreeMap::from([(first_row.data_hash.clone(), export_unit)]),
        classification_answers,
        consensus_meta,
    })
}

/// Generate a record identifier unique within the document.
///
/// Identifiers are deliberately fresh rather than derived from region
/// identity, so they can never collide with platform-side hashes.
fn generate_record_id(used: &mut HashSet<String>) -> String {
    loop {
        let id: String = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(RECORD_ID_LENGTH)
            .map(char::from)
            .collect();
        if used.insert(id.clone()) {
            return id;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate_views;
    use crate::extraction::ClassificationView;
    use crate::region::find_regions_of_interest;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use serde_json::json;

    fn sources() -> Vec<(String, LabelRow)> {
        let row = serde_json::from_value(json!({
            "label_hash": "lh-1",
            "dataset_hash": "ds-1",
            "dataset_title": "Surgical Phases",
            "data_title": "procedure.mp4",
            "data_hash": "dh-1",
            "data_type": "video",
            "data_units": {
                "dh-1": {
                    "data_hash": "dh-1",
                    "data_title": "procedure.mp4",
                    "data_type": "video/mp4",
                    "data_fps": 25.0,
                    "labels": {}
                }
            },
            "classification_answers": {}
        }))
        .unwrap();
        vec![("p-1".to_string(), row)]
    }

    fn answer_payload() -> Vec<AnswerPart> {
        serde_json::from_value(json!([
            {
                "name": "Phase",
                "value": "phase",
                "featureHash": "q-1",
                "answers": [{ "name": "Incision", "value": "incision", "featureHash": "o-1" }]
            }
        ]))
        .unwrap()
    }

    fn regions() -> Vec<RegionOfInterest> {
        let answer = crate::answer::Answer {
            fq_name: "phase=incision".to_string(),
            fq_parts: Vec::new(),
            name: "Phase".to_string(),
            value: "phase".to_string(),
            feature_hash: "attr-1".to_string(),
            payload: answer_payload(),
        };
        let views = vec![
            ClassificationView {
                answer: answer.clone(),
                frames: vec![1, 2, 3, 8],
                source: "p-1".to_string(),
            },
            ClassificationView {
                answer,
                frames: vec![2, 3, 4],
                source: "p-2".to_string(),
            },
        ];
        find_regions_of_interest(&aggregate_views(&views), 2).unwrap()
    }

    fn fixed_time() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap()
    }

    fn all_keys(regions: &[RegionOfInterest]) -> HashSet<RegionKey> {
        regions.iter().map(|r| r.key()).collect()
    }

    #[test]
    fn empty_selection_exports_no_entries() {
        let regions = regions();
        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &HashSet::new(),
            fixed_time(),
        )
        .unwrap();

        assert!(doc.classification_answers.is_empty());
        assert!(doc.consensus_meta.is_empty());
        assert!(doc.data_units["dh-1"].labels.is_empty());
    }

    #[test]
    fn full_selection_exports_every_region_once() {
        let regions = regions();
        assert_eq!(regions.len(), 2, "frames 1-4 and lone frame 8");

        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &all_keys(&regions),
            fixed_time(),
        )
        .unwrap();

        assert_eq!(doc.classification_answers.len(), 2);
        assert_eq!(doc.consensus_meta.len(), 2);
        // 4 frames from region 0 plus 1 from region 1.
        assert_eq!(doc.data_units["dh-1"].labels.len(), 5);
        for labels in doc.data_units["dh-1"].labels.values() {
            assert_eq!(labels.classifications.len(), 1);
        }
    }

    #[test]
    fn subset_selection_filters_strictly() {
        let regions = regions();
        let only_first = HashSet::from([RegionKey {
            fq_name: "phase=incision".to_string(),
            region_number: 0,
        }]);

        let doc =
            export_regions_of_interest(&regions, &sources(), &only_first, fixed_time())
                .unwrap();

        assert_eq!(doc.classification_answers.len(), 1);
        let frames: Vec<&String> = doc.data_units["dh-1"].labels.keys().collect();
        assert_eq!(frames, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn header_fields_come_from_first_row() {
        let regions = regions();
        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &all_keys(&regions),
            fixed_time(),
        )
        .unwrap();

        assert_eq!(doc.dataset_hash, "ds-1");
        assert_eq!(doc.dataset_title, "Surgical Phases");
        assert_eq!(doc.data_title, "procedure.mp4");
        assert_eq!(doc.data_hash, "dh-1");
        assert_eq!(doc.data_type, "video");
        assert_eq!(doc.data_units["dh-1"].extra["data_fps"], 25.0);
    }

    #[test]
    fn label_entries_carry_votes_and_counts() {
        let regions = regions();
        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &all_keys(&regions),
            fixed_time(),
        )
        .unwrap();

        let labels = &doc.data_units["dh-1"].labels;
        let frame_2 = &labels["2"].classifications[0];
        assert_eq!(frame_2.vote_project_hashes, vec!["p-1", "p-2"]);
        assert_eq!(frame_2.vote_count, 2);
        assert_eq!(frame_2.name, "Phase");
        assert_eq!(frame_2.feature_hash, "attr-1");
    }

    #[test]
    fn record_ids_are_fresh_and_unique() {
        let regions = regions();
        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &all_keys(&regions),
            fixed_time(),
        )
        .unwrap();

        let ids: Vec<&String> = doc.classification_answers.keys().collect();
        assert_eq!(ids.len(), 2);
        for id in &ids {
            assert_eq!(id.len(), RECORD_ID_LENGTH);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        }
        // The entry's own hash field matches its document key.
        for (id, entry) in &doc.classification_answers {
            assert_eq!(&entry.classification_hash, id);
        }
    }

    #[test]
    fn timestamps_use_fixed_gmt_format() {
        let regions = regions();
        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &all_keys(&regions),
            fixed_time(),
        )
        .unwrap();

        for entry in doc.classification_answers.values() {
            assert_eq!(entry.created_at, "Tue, 05 Mar 2024 12:30:00 GMT");
        }
    }

    #[test]
    fn consensus_meta_mirrors_region_statistics() {
        let regions = regions();
        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &all_keys(&regions),
            fixed_time(),
        )
        .unwrap();

        let scores: HashSet<String> = doc
            .consensus_meta
            .values()
            .map(|m| format!("{}@{}", m.answer_fq_name, m.region_number))
            .collect();
        assert_eq!(
            scores,
            HashSet::from(["phase=incision@0".to_string(), "phase=incision@1".to_string()])
        );
    }

    #[test]
    fn serialized_document_uses_platform_key_casing() {
        let regions = regions();
        let doc = export_regions_of_interest(
            &regions,
            &sources(),
            &all_keys(&regions),
            fixed_time(),
        )
        .unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        let (_, answer_record) = value["classification_answers"]
            .as_object()
            .unwrap()
            .iter()
            .next()
            .unwrap();
        assert!(answer_record.get("classificationHash").is_some());
        assert!(answer_record.get("createdAt").is_some());

        let frame_entry = &value["data_units"]["dh-1"]["labels"]["2"]["classifications"][0];
        assert!(frame_entry.get("voteProjectHashes").is_some());
        assert!(frame_entry.get("voteCount").is_some());
    }

    #[test]
    fn no_sources_is_a_validation_error() {
        let regions = regions();
        assert_matches!(
            export_regions_of_interest(&regions, &[], &all_keys(&regions), fixed_time()),
            Err(CoreError::Validation(_))
        );
    }
}
