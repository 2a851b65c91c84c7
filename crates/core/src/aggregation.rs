//! Cross-source vote aggregation.
//!
//! Merges classification views from every selected source by canonical
//! answer key and records, per frame, the ordered list of sources voting
//! that answer present. Vote lists keep source processing order; consumers
//! must not assume they are sorted.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::answer::Answer;
use crate::extraction::ClassificationView;
use crate::types::FrameIndex;

/// All votes for one canonical answer across every selected source.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedView {
    pub answer: Answer,
    /// Frame index -> sources voting this answer at that frame, in
    /// processing order. A source appears at most once per frame.
    pub frame_votes: BTreeMap<FrameIndex, Vec<String>>,
}

/// Group classification views by canonical answer and merge their frames
/// into per-frame vote lists.
///
/// Views are grouped by `fq_name`, never by object identity, so
/// semantically identical answers from different sources always merge.
/// A second vote from a source already present at (answer, frame) is
/// dropped rather than allowed to inflate counts.
pub fn aggregate_views(views: &[ClassificationView]) -> Vec<AggregatedView> {
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, AggregatedView> = HashMap::new();

    for view in views {
        let fq_name = view.answer.fq_name.clone();
        let aggregated = by_name.entry(fq_name.clone()).or_insert_with(|| {
            order.push(fq_name);
            AggregatedView {
                answer: view.answer.clone(),
                frame_votes: BTreeMap::new(),
            }
        });

        for &frame in &view.frames {
            let votes = aggregated.frame_votes.entry(frame).or_default();
            if !votes.iter().any(|source| source == &view.source) {
                votes.push(view.source.clone());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|fq_name| by_name.remove(&fq_name))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::FQPart;

    fn answer(fq_name: &str) -> Answer {
        Answer {
            fq_name: fq_name.to_string(),
            fq_parts: vec![FQPart {
                question: "q".to_string(),
                answer: fq_name.to_string(),
                fq_part: format!("q={fq_name}"),
                feature_hash: "q-1".to_string(),
            }],
            name: "Q".to_string(),
            value: "q".to_string(),
            feature_hash: "attr-1".to_string(),
            payload: Vec::new(),
        }
    }

    fn view(fq_name: &str, source: &str, frames: &[FrameIndex]) -> ClassificationView {
        ClassificationView {
            answer: answer(fq_name),
            frames: frames.to_vec(),
            source: source.to_string(),
        }
    }

    #[test]
    fn merges_sources_sharing_an_answer() {
        let views = vec![
            view("q=a", "p-1", &[1, 2, 3]),
            view("q=a", "p-2", &[2, 3, 4]),
        ];
        let aggregated = aggregate_views(&views);

        assert_eq!(aggregated.len(), 1);
        let votes = &aggregated[0].frame_votes;
        assert_eq!(votes[&1], vec!["p-1"]);
        assert_eq!(votes[&2], vec!["p-1", "p-2"]);
        assert_eq!(votes[&3], vec!["p-1", "p-2"]);
        assert_eq!(votes[&4], vec!["p-2"]);
    }

    #[test]
    fn distinct_answers_stay_separate() {
        let views = vec![view("q=a", "p-1", &[1]), view("q=b", "p-1", &[1])];
        let aggregated = aggregate_views(&views);

        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated[0].answer.fq_name, "q=a");
        assert_eq!(aggregated[1].answer.fq_name, "q=b");
    }

    #[test]
    fn vote_order_follows_processing_order() {
        let views = vec![
            view("q=a", "p-2", &[7]),
            view("q=a", "p-1", &[7]),
        ];
        let aggregated = aggregate_views(&views);
        assert_eq!(aggregated[0].frame_votes[&7], vec!["p-2", "p-1"]);
    }

    #[test]
    fn duplicate_source_votes_are_dropped() {
        let views = vec![
            view("q=a", "p-1", &[5, 5]),
            view("q=a", "p-1", &[5]),
        ];
        let aggregated = aggregate_views(&views);
        assert_eq!(aggregated[0].frame_votes[&5], vec!["p-1"]);
    }

    #[test]
    fn empty_input_yields_no_views() {
        assert!(aggregate_views(&[]).is_empty());
    }

    #[test]
    fn answer_order_is_first_seen() {
        let views = vec![
            view("q=b", "p-1", &[1]),
            view("q=a", "p-1", &[2]),
            view("q=b", "p-2", &[3]),
        ];
        let aggregated = aggregate_views(&views);
        assert_eq!(aggregated[0].answer.fq_name, "q=b");
        assert_eq!(aggregated[1].answer.fq_name, "q=a");
    }
}
