#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Ontology or input-shape problems that make canonicalization
    /// impossible: zero or multiple attribute matches for a feature hash,
    /// malformed precedence ids.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or inconsistent label data: bad frame keys, dangling
    /// classification hashes, incompatible source selections.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Inputs that violate upstream invariants: an empty region reaching
    /// the scorer, a pass with zero selected sources.
    #[error("Degenerate input: {0}")]
    Degenerate(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
