//! Plan pipeline errors
//!
//! Only the fatal outcomes are errors. Degraded context calls never leave
//! the pipeline; they are replaced by placeholder text.

use itinera_gateway::GatewayError;
use itinera_llm::GenerationError;
use thiserror::Error;

use crate::stage::PlanStage;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to geocode city (Critical)")]
    Geocode(#[source] GatewayError),

    #[error("Failed Pass 1 (Draft Generation)")]
    Draft(#[source] GenerationError),

    #[error("Failed to initiate generation stream")]
    StreamInit(#[source] GenerationError),
}

impl PlanError {
    /// Terminal stage the request ended in.
    pub fn stage(&self) -> PlanStage {
        match self {
            PlanError::Geocode(_) => PlanStage::GeocodeFailed,
            PlanError::Draft(_) => PlanStage::DraftFailed,
            PlanError::StreamInit(_) => PlanStage::StreamFailed,
        }
    }

    /// Underlying error text, for diagnostics.
    pub fn details(&self) -> String {
        match self {
            PlanError::Geocode(e) => e.to_string(),
            PlanError::Draft(e) | PlanError::StreamInit(e) => e.to_string(),
        }
    }
}
