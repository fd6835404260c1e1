//! Generation error types

use thiserror::Error;

/// Failure of a call to the generation service.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("failed to send generation request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("generation API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode generation response: {0}")]
    Decode(String),

    #[error("generation service returned an empty response")]
    EmptyResponse,

    #[error("model returned unparsable JSON: {reason}. Raw: {raw}")]
    UnparsableOutput { raw: String, reason: String },

    #[error("model returned a draft with no stops")]
    EmptyDraft,

    #[error("failed to open generation stream: {0}")]
    StreamInit(String),
}

/// Result type alias using the generation error
pub type Result<T> = std::result::Result<T, GenerationError>;

impl GenerationError {
    /// Raw model output attached to the error, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            GenerationError::UnparsableOutput { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
