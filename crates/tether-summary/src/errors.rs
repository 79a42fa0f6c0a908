//! Summarization error types.

/// Result alias for summarization operations.
pub type Result<T> = std::result::Result<T, SummaryError>;

/// Errors raised while generating a memory.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// Transport-level HTTP failure.
    #[error("summarization request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Collaborator answered with a non-success status.
    #[error("summarization endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// Collaborator answered success but produced no summary text.
    #[error("summarization endpoint returned an empty summary")]
    EmptySummary,

    /// Reading or writing the conversation store failed.
    #[error(transparent)]
    Store(#[from] tether_store::errors::StoreError),
}
