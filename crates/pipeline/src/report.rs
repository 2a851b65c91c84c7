//! Plain-text region reports.
//!
//! The dashboard shows each region's identity and statistics in a
//! fixed-width code block; this module renders that text so the UI layer
//! stays free of formatting logic.

use std::fmt::Write as _;

use concord_core::RegionOfInterest;

/// Render the mini report for one region: its number, the answered
/// questions (indented by nesting depth), the integrated score, the
/// at-least-N lines, and the N-scores.
pub fn format_region_report(region: &RegionOfInterest) -> String {
    let mut out = format!("Region number {}\n\nSelected Answers\n", region.region_number);

    for (depth, part) in region.answer.fq_parts.iter().enumerate() {
        for _ in 0..depth {
            out.push('\t');
        }
        let _ = writeln!(out, "{}: {}", part.question, part.answer);
    }

    let data = &region.consensus_data;
    let _ = write!(
        out,
        "\nMini Report\nIntegrated Agreement Score: {}\n\n",
        data.integrated_agreement_score
    );
    for (n, frames) in &data.min_n_agreement {
        let _ = writeln!(out, "At least {n} annotators agreeing: {frames} frames");
    }

    if !data.n_scores.is_empty() {
        out.push_str("\nN Scores\n");
        for (n, score) in &data.n_scores {
            let _ = writeln!(out, "{n}-score: {score}");
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
