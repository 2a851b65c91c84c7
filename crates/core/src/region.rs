//! Region segmentation.
//!
//! Partitions each aggregated answer's voted frames into maximal runs of
//! strictly consecutive frame indices. A frame absent from the vote map
//! carries zero votes and ends the run. Region numbering restarts at 0 per
//! answer, in ascending frame order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::aggregation::AggregatedView;
use crate::answer::Answer;
use crate::error::CoreError;
use crate::scoring::{score_region, ConsensusData};
use crate::types::FrameIndex;

// ---------------------------------------------------------------------------
// RegionKey
// ---------------------------------------------------------------------------

/// Structural identity of a region: the answer's canonical key plus the
/// per-answer region sequence number. Used for UI selection and export
/// filtering; deliberately not a language hash, so identity is stable
/// across sessions and processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionKey {
    pub fq_name: String,
    pub region_number: usize,
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.fq_name, self.region_number)
    }
}

// ---------------------------------------------------------------------------
// RegionOfInterest
// ---------------------------------------------------------------------------

/// A maximal contiguous run of frames carrying at least one vote for one
/// canonical answer, with its derived consensus statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RegionOfInterest {
    pub answer: Answer,
    /// Frame -> voting sources, restricted to this region's run.
    pub frame_votes: BTreeMap<FrameIndex, Vec<String>>,
    /// Frame -> vote count.
    pub frame_vote_counts: BTreeMap<FrameIndex, usize>,
    /// Sequence number within this answer, ascending by frame, from 0.
    pub region_number: usize,
    pub consensus_data: ConsensusData,
}

impl RegionOfInterest {
    /// The region's structural identity.
    pub fn key(&self) -> RegionKey {
        RegionKey {
            fq_name: self.answer.fq_name.clone(),
            region_number: self.region_number,
        }
    }

    /// Per-source maximal contiguous (start, end) frame ranges within this
    /// region, for the per-project agreement view.
    pub fn ranges_by_source(&self) -> BTreeMap<String, Vec<(FrameIndex, FrameIndex)>> {
        let mut ranges: BTreeMap<String, Vec<(FrameIndex, FrameIndex)>> = BTreeMap::new();
        let mut open: HashMap<&str, FrameIndex> = HashMap::new();

        for (&frame, votes) in &self.frame_votes {
            for source in votes {
                open.entry(source.as_str()).or_insert(frame);

                let continues = frame
                    .checked_add(1)
                    .and_then(|next| self.frame_votes.get(&next))
                    .is_some_and(|next_votes| next_votes.iter().any(|s| s == source));
                if !continues {
                    let start = open.remove(source.as_str()).unwrap_or(frame);
                    ranges.entry(source.clone()).or_default().push((start, frame));
                }
            }
        }

        ranges
    }
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// Segment every aggregated view into scored regions of interest.
///
/// `total_sources` is the selected-source count used for score
/// normalization. Regions are emitted per answer in view order, ascending
/// by frame within an answer.
pub fn find_regions_of_interest(
    views: &[AggregatedView],
    total_sources: usize,
) -> Result<Vec<RegionOfInterest>, CoreError> {
    let mut regions = Vec::new();

    for view in views {
        let mut run: BTreeMap<FrameIndex, Vec<String>> = BTreeMap::new();
        let mut region_number = 0usize;
        let mut last_frame: Option<FrameIndex> = None;

        for (&frame, votes) in &view.frame_votes {
            if let Some(last) = last_frame {
                if last.checked_add(1) != Some(frame) {
                    regions.push(build_region(
                        &view.answer,
                        std::mem::take(&mut run),
                        region_number,
                        total_sources,
                    )?);
                    region_number += 1;
                }
            }
            run.insert(frame, votes.clone());
            last_frame = Some(frame);
        }

        if !run.is_empty() {
            regions.push(build_region(&view.answer, run, region_number, total_sources)?);
        }
    }

    Ok(regions)
}

fn build_region(
    answer: &Answer,
    frame_votes: BTreeMap<FrameIndex, Vec<String>>,
    region_number: usize,
    total_sources: usize,
) -> Result<RegionOfInterest, CoreError> {
    let frame_vote_counts: BTreeMap<FrameIndex, usize> = frame_votes
        .iter()
        .map(|(&frame, votes)| (frame, votes.len()))
        .collect();
    let consensus_data = score_region(&frame_vote_counts, total_sources)?;

    Ok(RegionOfInterest {
        answer: answer.clone(),
        frame_votes,
        frame_vote_counts,
        region_number,
        consensus_data,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
