//! Error types for commitnote-claude

use thiserror::Error;

/// Errors that can occur while synthesizing a note
#[derive(Debug, Error)]
pub enum SynthError {
    /// The credential environment variable is unset or blank
    #[error("Missing Anthropic API key: environment variable {0} is not set")]
    MissingApiKey(String),

    /// Transport failure, including request timeouts
    #[error("Request to text-generation service failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Text-generation service returned {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body as text
        body: String,
    },

    /// The response envelope could not be decoded
    #[error("Invalid response from text-generation service: {0}")]
    InvalidResponse(String),

    /// The generated text does not follow the TITLE/CONTENT layout
    #[error("Failed to parse generated note: {0}")]
    Parse(String),
}

impl SynthError {
    /// Whether the error stems from local configuration rather than the service
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey(_))
    }
}
