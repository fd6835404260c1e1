//! Gateway error classification

use thiserror::Error;

/// Failure of a single gateway call.
///
/// The variants are kept apart so the caller can decide whether a failure
/// is fatal (geocoding) or degrades to a placeholder (everything else).
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Network(#[source] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode gateway response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),
}

/// Result type alias using the gateway error
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Network(e) if e.is_timeout())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
