//! Consensus agreement statistics.
//!
//! All scores are derived from per-frame vote counts: the peak simultaneous
//! agreement, the integrated (density) agreement score over a region's
//! span, and the at-least-N-annotators suffix histogram with its normalized
//! N-score variant. A corpus-wide histogram over every region feeds the
//! top-level agreement report.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::region::RegionOfInterest;
use crate::types::FrameIndex;

/// Derived, read-only agreement statistics for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusData {
    /// Peak simultaneous vote count within the region.
    pub max_agreement: usize,
    /// Vote density over the region span, normalized by the total number
    /// of selected sources. Rounded to 4 decimals; 1.0 means every frame
    /// carries every source's vote.
    pub integrated_agreement_score: f64,
    /// For each n in 1..=max observed count, the number of frames with at
    /// least n votes. Monotonically non-increasing in n.
    pub min_n_agreement: BTreeMap<usize, usize>,
    /// For each n in 2..=total sources, the fraction of voted frames
    /// reaching at least n-way agreement. Rounded to 4 decimals.
    pub n_scores: BTreeMap<usize, f64>,
}

/// Compute the consensus statistics for one region's vote counts.
///
/// `total_sources` is the number of currently selected sources, constant
/// for the whole pass. An empty region or a zero source count violates the
/// segmentation invariants and is rejected as degenerate.
pub fn score_region(
    frame_vote_counts: &BTreeMap<FrameIndex, usize>,
    total_sources: usize,
) -> Result<ConsensusData, CoreError> {
    if total_sources == 0 {
        return Err(CoreError::Degenerate(
            "cannot score a region with zero selected sources".to_string(),
        ));
    }

    let (first, last) = match (
        frame_vote_counts.keys().next(),
        frame_vote_counts.keys().next_back(),
    ) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(CoreError::Degenerate(
                "cannot score a region with no voted frames".to_string(),
            ))
        }
    };

    let max_agreement = frame_vote_counts.values().copied().max().unwrap_or(0);

    let num_frames = u64::from(last - first) + 1;
    let total_votes: u64 = frame_vote_counts.values().map(|&count| count as u64).sum();
    let integrated_agreement_score =
        round4(total_votes as f64 / (total_sources as f64 * num_frames as f64));

    let min_n_agreement = suffix_histogram(frame_vote_counts.values().copied());

    let any_agreement = min_n_agreement.get(&1).copied().unwrap_or(0);
    if any_agreement == 0 {
        return Err(CoreError::Degenerate(
            "region has no frame with at least one vote".to_string(),
        ));
    }

    let mut n_scores = BTreeMap::new();
    for n in 2..=total_sources {
        let qualifying = min_n_agreement.get(&n).copied().unwrap_or(0);
        n_scores.insert(n, round4(qualifying as f64 / any_agreement as f64));
    }

    Ok(ConsensusData {
        max_agreement,
        integrated_agreement_score,
        min_n_agreement,
        n_scores,
    })
}

/// Corpus-wide at-least-N histogram over every voted frame of every region
/// of every answer. Feeds the top-level agreement report chart.
pub fn frame_level_min_n_agreement(regions: &[RegionOfInterest]) -> BTreeMap<usize, usize> {
    suffix_histogram(
        regions
            .iter()
            .flat_map(|region| region.frame_vote_counts.values().copied()),
    )
}

/// The dashboard's region filter: minimum peak agreement and minimum
/// integrated agreement score.
pub fn filter_regions(
    regions: &[RegionOfInterest],
    min_agreement: usize,
    min_score: f64,
) -> Vec<&RegionOfInterest> {
    regions
        .iter()
        .filter(|region| {
            region.consensus_data.max_agreement >= min_agreement
                && region.consensus_data.integrated_agreement_score >= min_score
        })
        .collect()
}

/// Suffix-sum the exact vote-count histogram: for each n in 1..=max
/// observed, how many observations reach at least n. Zero counts are
/// ignored.
fn suffix_histogram(counts: impl Iterator<Item = usize>) -> BTreeMap<usize, usize> {
    let mut exact: BTreeMap<usize, usize> = BTreeMap::new();
    let mut max_count = 0usize;
    for count in counts {
        if count == 0 {
            continue;
        }
        *exact.entry(count).or_insert(0) += 1;
        max_count = max_count.max(count);
    }

    let mut result = BTreeMap::new();
    let mut running = 0usize;
    for n in (1..=max_count).rev() {
        running += exact.get(&n).copied().unwrap_or(0);
        result.insert(n, running);
    }
    result
}

/// Round to 4 decimal places, the precision carried in exports and reports.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
