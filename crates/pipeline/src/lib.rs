//! Concord pipeline: orchestration around the core consensus engine.
//!
//! Building blocks for the session layer of the consensus dashboard:
//!
//! - [`run_consensus`] — one full pass over pre-fetched label rows,
//!   producing a [`ConsensusOutcome`].
//! - [`SessionCache`] — externally-owned cache of completed passes keyed
//!   by (selected sources, selected file).
//! - [`FilterConfig`] — region filter defaults from the environment.
//! - [`format_region_report`] — plain-text region summaries for the UI.

pub mod config;
pub mod error;
pub mod report;
pub mod run;
pub mod session;

pub use config::FilterConfig;
pub use error::PipelineError;
pub use report::format_region_report;
pub use run::{run_consensus, ConsensusOutcome};
pub use session::{cache_key, SessionCache};
