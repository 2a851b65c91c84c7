//! One consensus pass over pre-fetched inputs.
//!
//! Runs the core stages in order (compatibility validation, ontology
//! indexing, per-source extraction, aggregation, segmentation and scoring)
//! and bundles the results with the data-quality warnings accumulated along
//! the way. A pass either completes or fails outright; there are no partial
//! results.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use concord_core::{
    aggregate_views, extract_views, find_regions_of_interest, frame_level_min_n_agreement,
    validate_source_compatibility, DataQualityWarning, LabelRow, OntologyIndex,
    RegionOfInterest,
};

use crate::error::PipelineError;

/// Everything one consensus pass produces.
#[derive(Debug, Serialize)]
pub struct ConsensusOutcome {
    /// Identifier of this pass, for log correlation.
    pub pass_id: Uuid,
    /// Number of selected sources; the normalization constant for every
    /// score in `regions`.
    pub total_sources: usize,
    /// All regions of interest, per answer in first-seen order, ascending
    /// by frame within an answer.
    pub regions: Vec<RegionOfInterest>,
    /// Corpus-wide at-least-N agreement histogram for the report chart.
    pub agreement_histogram: BTreeMap<usize, usize>,
    /// Classifications skipped as unsupported, across all sources.
    pub warnings: Vec<DataQualityWarning>,
}

/// Run a full consensus pass.
///
/// `ontology_classifications` is the platform ontology's
/// classification-attribute list; `sources` pairs each selected source
/// identifier with its label row for the selected media item, in selection
/// order (vote lists follow this order).
pub fn run_consensus(
    ontology_classifications: &serde_json::Value,
    sources: &[(String, LabelRow)],
) -> Result<ConsensusOutcome, PipelineError> {
    let pass_id = Uuid::new_v4();
    tracing::info!(%pass_id, source_count = sources.len(), "Starting consensus pass");

    validate_source_compatibility(sources)?;
    let index = OntologyIndex::build(ontology_classifications)?;

    let mut views = Vec::new();
    let mut warnings = Vec::new();
    for (source, row) in sources {
        let extraction = extract_views(source, row, &index)?;
        tracing::debug!(
            %pass_id,
            source = %source,
            view_count = extraction.views.len(),
            "Extracted classification views"
        );
        views.extend(extraction.views);
        warnings.extend(extraction.warnings);
    }

    let aggregated = aggregate_views(&views);
    let regions = find_regions_of_interest(&aggregated, sources.len())?;
    let agreement_histogram = frame_level_min_n_agreement(&regions);

    if !warnings.is_empty() {
        tracing::warn!(
            %pass_id,
            skipped = warnings.len(),
            "Consensus pass skipped unsupported classifications"
        );
    }
    tracing::info!(
        %pass_id,
        answer_count = aggregated.len(),
        region_count = regions.len(),
        "Consensus pass complete"
    );

    Ok(ConsensusOutcome {
        pass_id,
        total_sources: sources.len(),
        regions,
        agreement_histogram,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
