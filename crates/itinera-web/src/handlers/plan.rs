//! Plan Handler

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use chrono::NaiveDate;
use itinera_core::PlanRequest;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::ApiError;
use crate::sse;
use crate::state::AppState;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// POST /api/v1/plan - Run the plan pipeline and stream the narrated itinerary
pub async fn plan_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let request = validate(request)?;

    info!(
        "Plan request: city={} date={} preferences={:?}",
        request.city, request.date, request.preferences
    );

    let stream = state.pipeline.run(&request, CancellationToken::new()).await?;
    info!(
        request_id = %stream.request_id(),
        intent = %stream.trace().intent,
        "Streaming plan"
    );

    Ok(sse::event_stream(stream.into_frames()))
}

/// Trim and check the required fields.
pub fn validate(mut request: PlanRequest) -> Result<PlanRequest, ApiError> {
    request.city = request.city.trim().to_string();
    request.date = request.date.trim().to_string();

    if request.city.is_empty() {
        return Err(ApiError::Validation("city must not be empty".to_string()));
    }
    if request.date.is_empty() {
        return Err(ApiError::Validation("date must not be empty".to_string()));
    }
    NaiveDate::parse_from_str(&request.date, DATE_FORMAT).map_err(|e| {
        ApiError::Validation(format!(
            "date '{}' is not a valid YYYY-MM-DD date: {}",
            request.date, e
        ))
    })?;

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims() {
        let request = validate(PlanRequest::new("  Kyoto ", " 2025-12-12")).unwrap();
        assert_eq!(request.city, "Kyoto");
        assert_eq!(request.date, "2025-12-12");
    }

    #[test]
    fn test_validate_rejects_blank_and_malformed() {
        assert!(validate(PlanRequest::new("   ", "2025-12-12")).is_err());
        assert!(validate(PlanRequest::new("Kyoto", "")).is_err());
        assert!(validate(PlanRequest::new("Kyoto", "12/12/2025")).is_err());
        assert!(validate(PlanRequest::new("Kyoto", "2025-02-30")).is_err());
    }
}
