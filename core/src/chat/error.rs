use std::error::Error as StdError;

use thiserror::Error;


/// Failures of a single LLM round trip.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No model endpoint is configured. Raised before any network call.
    #[error("Missing LLM model URL, please set it in the options panel")]
    MissingModel,

    /// The configured model endpoint is not a valid URL.
    #[error("Invalid LLM model URL '{url}': {reason}")]
    InvalidModelUrl { url: String, reason: String },

    /// The endpoint answered with a non-success status. `body` is the raw
    /// response text.
    #[error("LLM-CONNECTION: Error response from {url}: {body}")]
    Http { url: String, status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Response parsing error: {0}")]
    Parsing(#[source] Box<dyn StdError + Send + Sync>),

    /// The request was aborted through its cancellation signal.
    #[error("Request cancelled: {reason}")]
    Cancelled { reason: String },
}

impl LlmError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LlmError::Cancelled { .. })
    }
}
