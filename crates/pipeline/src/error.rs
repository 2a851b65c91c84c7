use concord_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A fatal error raised by one of the core consensus stages.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed environment configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}
