//! HTTP error bodies
//!
//! Every error is written as JSON before any stream frame.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use itinera_planner::PlanError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or invalid request body → 400
    #[error("{0}")]
    Validation(String),

    /// Fatal pipeline failure → 502
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Plan(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(message) => {
                warn!("Rejected plan request: {}", message);
                (status, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Plan(err) => {
                let details = err.details();
                error!(stage = %err.stage(), "{}: {}", err, details);
                (
                    status,
                    Json(json!({
                        "error": err.to_string(),
                        "details": details,
                        "stage": err.stage(),
                    })),
                )
                    .into_response()
            }
        }
    }
}
