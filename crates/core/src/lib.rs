//! Concord core: consensus aggregation and scoring over multi-annotator
//! frame classification labels.
//!
//! The crate is a pure, synchronous transformation pipeline over in-memory
//! structures: no I/O, no async, no shared mutable state. The stages, in
//! data-flow order:
//!
//! - [`ontology`] — per-session precedence index over the classification
//!   ontology.
//! - [`answer`] — canonicalization of raw classifications into
//!   order-independent identity keys.
//! - [`extraction`] — per-source classification views over frame-indexed
//!   label data.
//! - [`aggregation`] — cross-source vote merging by canonical answer.
//! - [`region`] — segmentation of voted frames into maximal contiguous
//!   regions of interest.
//! - [`scoring`] — agreement statistics per region and corpus-wide.
//! - [`export`] — projection of selected regions into the platform
//!   interchange document.

pub mod aggregation;
pub mod answer;
pub mod error;
pub mod export;
pub mod extraction;
pub mod hashing;
pub mod label_row;
pub mod ontology;
pub mod region;
pub mod scoring;
pub mod types;

pub use aggregation::{aggregate_views, AggregatedView};
pub use answer::{canonicalize_classification, Answer, Canonicalization, FQPart, SkipReason};
pub use error::CoreError;
pub use export::{export_regions_of_interest, ExportDocument};
pub use extraction::{extract_views, ClassificationView, DataQualityWarning, SourceExtraction};
pub use label_row::{validate_source_compatibility, LabelRow};
pub use ontology::OntologyIndex;
pub use region::{find_regions_of_interest, RegionKey, RegionOfInterest};
pub use scoring::{filter_regions, frame_level_min_n_agreement, score_region, ConsensusData};
