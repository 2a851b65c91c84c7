//! End-to-end consensus flow: label rows in, scored regions and export
//! document out, with session caching in between.

use std::collections::HashSet;

use chrono::TimeZone;
use serde_json::json;

use concord_core::{export_regions_of_interest, filter_regions, LabelRow, RegionKey};
use concord_pipeline::{cache_key, run_consensus, SessionCache};

fn ontology() -> serde_json::Value {
    json!([
        {
            "id": "1",
            "featureNodeHash": "attr-phase",
            "attributes": [
                {
                    "id": "1.1",
                    "name": "Phase",
                    "value": "phase",
                    "featureNodeHash": "q-phase",
                    "options": [
                        { "id": "1.1.1", "label": "Incision", "value": "incision", "featureNodeHash": "o-incision" },
                        { "id": "1.1.2", "label": "Suture", "value": "suture", "featureNodeHash": "o-suture" }
                    ]
                }
            ]
        }
    ])
}

/// A label row voting `option` on the given frames, all on the same media
/// item `dh-1` from dataset `ds-1`.
fn label_row(suffix: &str, option: (&str, &str), frames: &[u32]) -> (String, LabelRow) {
    let (option_value, option_hash) = option;
    let labels: serde_json::Map<String, serde_json::Value> = frames
        .iter()
        .map(|frame| {
            (
                frame.to_string(),
                json!({
                    "classifications": [
                        {
                            "classificationHash": "c-1",
                            "featureHash": "attr-phase",
                            "name": "Phase",
                            "value": "phase"
                        }
                    ]
                }),
            )
        })
        .collect();

    let row = serde_json::from_value(json!({
        "label_hash": format!("lh-{suffix}"),
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
                "labels": labels
            }
        },
        "classification_answers": {
            "c-1": {
                "classificationHash": "c-1",
                "classifications": [
                    {
                        "name": "Phase",
                        "value": "phase",
                        "featureHash": "q-phase",
                        "answers": [{ "value": option_value, "featureHash": option_hash }]
                    }
                ]
            }
        }
    }))
    .unwrap();
    (format!("p-{suffix}"), row)
}

#[test]
fn two_annotator_overlap_produces_scored_region_and_export() {
    let sources = vec![
        label_row("1", ("incision", "o-incision"), &[1, 2, 3]),
        label_row("2", ("incision", "o-incision"), &[2, 3, 4]),
    ];

    let outcome = run_consensus(&ontology(), &sources).unwrap();

    // One shared answer, one contiguous region over frames 1-4.
    assert_eq!(outcome.total_sources, 2);
    assert_eq!(outcome.regions.len(), 1);
    let region = &outcome.regions[0];
    assert_eq!(region.answer.fq_name, "phase=incision");
    assert_eq!(
        region.frame_votes.get(&2).map(Vec::as_slice),
        Some(["p-1".to_string(), "p-2".to_string()].as_slice())
    );
    assert_eq!(region.consensus_data.max_agreement, 2);
    assert_eq!(region.consensus_data.integrated_agreement_score, 0.75);
    assert_eq!(region.consensus_data.min_n_agreement[&1], 4);
    assert_eq!(region.consensus_data.min_n_agreement[&2], 2);
    assert_eq!(region.consensus_data.n_scores[&2], 0.5);
    assert_eq!(outcome.agreement_histogram[&2], 2);

    // Export the full selection.
    let include: HashSet<RegionKey> = outcome.regions.iter().map(|r| r.key()).collect();
    let exported_at = chrono::Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap();
    let doc =
        export_regions_of_interest(&outcome.regions, &sources, &include, exported_at).unwrap();

    assert_eq!(doc.data_hash, "dh-1");
    assert_eq!(doc.classification_answers.len(), 1);
    let labels = &doc.data_units["dh-1"].labels;
    assert_eq!(labels.len(), 4);
    assert_eq!(labels["2"].classifications[0].vote_count, 2);

    // Empty selection exports nothing.
    let empty = export_regions_of_interest(&outcome.regions, &sources, &HashSet::new(), exported_at)
        .unwrap();
    assert!(empty.classification_answers.is_empty());
    assert!(empty.data_units["dh-1"].labels.is_empty());
}

#[test]
fn disagreeing_annotators_split_by_answer_and_filter() {
    let sources = vec![
        label_row("1", ("incision", "o-incision"), &[1, 2, 3, 10, 11]),
        label_row("2", ("suture", "o-suture"), &[2, 3]),
    ];

    let outcome = run_consensus(&ontology(), &sources).unwrap();

    // incision: regions 1-3 and 10-11; suture: region 2-3.
    assert_eq!(outcome.regions.len(), 3);
    let keys: Vec<String> = outcome.regions.iter().map(|r| r.key().to_string()).collect();
    assert_eq!(
        keys,
        vec!["phase=incision@0", "phase=incision@1", "phase=suture@0"]
    );

    // No frame reaches 2-way agreement, so a min-agreement filter of 2
    // hides everything.
    assert!(filter_regions(&outcome.regions, 2, 0.0).is_empty());
    assert_eq!(filter_regions(&outcome.regions, 1, 0.0).len(), 3);
}

#[test]
fn session_cache_round_trip() {
    let sources = vec![
        label_row("1", ("incision", "o-incision"), &[1, 2]),
        label_row("2", ("incision", "o-incision"), &[2, 3]),
    ];
    let source_hashes: Vec<String> = sources.iter().map(|(s, _)| s.clone()).collect();

    let mut cache = SessionCache::new();
    let key = cache_key("dh-1", &source_hashes);

    assert!(cache.get(&key).is_none());
    let outcome = run_consensus(&ontology(), &sources).unwrap();
    cache.insert(key.clone(), outcome);

    let cached = cache.get(&key).expect("pass should be cached");
    assert_eq!(cached.regions.len(), 1);

    // Deselecting a source means a different key; the stale entry is
    // explicitly invalidated.
    let narrowed = cache_key("dh-1", &source_hashes[..1].to_vec());
    assert_ne!(key, narrowed);
    assert!(cache.invalidate(&key));
    assert!(cache.is_empty());
}
