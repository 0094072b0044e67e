//! Error types for intent resolution
//!
//! These errors never reach callers of [`crate::IntentResolver::propose`];
//! the resolver records them as degradations and falls back.

/// Errors talking to the intent service
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// No API key configured
    #[error("intent service not configured")]
    NotConfigured,

    /// Transport or decoding failure
    #[error("intent service transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("intent service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response carried no text content
    #[error("intent service response had no text content")]
    EmptyResponse,
}

impl IntentError {
    /// Create status error, keeping a bounded slice of the body
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: crate::truncate_chars(body, 200).to_string(),
        }
    }
}

/// Errors from a proposal store
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Backing store cannot serve requests
    #[error("proposal store unavailable: {0}")]
    Unavailable(String),
}
