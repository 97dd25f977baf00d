//! Error types for the oracle layer.

/// Errors from prompting or calling the decision oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The HTTP backend failed or returned an unusable response.
    #[error("oracle backend error: {0}")]
    Backend(String),

    /// A prompt template failed to compile or render.
    #[error("prompt template error: {0}")]
    Template(String),
}
