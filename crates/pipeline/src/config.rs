//! Region filter defaults loaded from the environment.

use crate::error::PipelineError;

/// Env var overriding the default minimum peak agreement.
pub const ENV_MIN_AGREEMENT: &str = "CONCORD_MIN_AGREEMENT";

/// Env var overriding the default minimum integrated agreement score.
pub const ENV_MIN_SCORE: &str = "CONCORD_MIN_SCORE";

/// Show every region by default.
pub const DEFAULT_MIN_AGREEMENT: usize = 1;

/// No score cutoff by default.
pub const DEFAULT_MIN_SCORE: f64 = 0.0;

/// Initial values for the dashboard's region filter sliders.
///
/// All fields have defaults suitable for local development; override via
/// environment variables (a `.env` file is honoured).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Minimum peak agreement a region must reach to be shown.
    pub min_agreement: usize,
    /// Minimum integrated agreement score, in [0, 1].
    pub min_score: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_agreement: DEFAULT_MIN_AGREEMENT,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl FilterConfig {
    /// Load filter defaults from environment variables.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `CONCORD_MIN_AGREEMENT`| `1`     |
    /// | `CONCORD_MIN_SCORE`    | `0.0`   |
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenvy::dotenv().ok();

        let min_agreement = match std::env::var(ENV_MIN_AGREEMENT) {
            Ok(raw) => raw.parse().map_err(|_| {
                PipelineError::Config(format!(
                    "{ENV_MIN_AGREEMENT} must be a non-negative integer, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_MIN_AGREEMENT,
        };

        let min_score = match std::env::var(ENV_MIN_SCORE) {
            Ok(raw) => {
                let score: f64 = raw.parse().map_err(|_| {
                    PipelineError::Config(format!(
                        "{ENV_MIN_SCORE} must be a number, got '{raw}'"
                    ))
                })?;
                if !(0.0..=1.0).contains(&score) {
                    return Err(PipelineError::Config(format!(
                        "{ENV_MIN_SCORE} must be within [0, 1], got {score}"
                    )));
                }
                score
            }
            Err(_) => DEFAULT_MIN_SCORE,
        };

        Ok(Self {
            min_agreement,
            min_score,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
