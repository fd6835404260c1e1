//! Request state machine
//!
//! ```text
//! RECEIVED → GEOCODED → CONTEXT_GATHERED → DRAFTED → ROUTED → STREAMING → DONE
//!     │                        │                        │
//!     ▼                        ▼                        ▼
//! GEOCODE_FAILED          DRAFT_FAILED            STREAM_FAILED
//! ```
//!
//! The failure stages are terminal and are reached before any frame is
//! emitted.

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStage {
    Received,
    Geocoded,
    ContextGathered,
    Drafted,
    Routed,
    Streaming,
    Done,
    GeocodeFailed,
    DraftFailed,
    StreamFailed,
}

impl PlanStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStage::Received => "RECEIVED",
            PlanStage::Geocoded => "GEOCODED",
            PlanStage::ContextGathered => "CONTEXT_GATHERED",
            PlanStage::Drafted => "DRAFTED",
            PlanStage::Routed => "ROUTED",
            PlanStage::Streaming => "STREAMING",
            PlanStage::Done => "DONE",
            PlanStage::GeocodeFailed => "GEOCODE_FAILED",
            PlanStage::DraftFailed => "DRAFT_FAILED",
            PlanStage::StreamFailed => "STREAM_FAILED",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PlanStage::GeocodeFailed | PlanStage::DraftFailed | PlanStage::StreamFailed
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == PlanStage::Done || self.is_failure()
    }

    /// Whether `next` is a legal successor of this stage.
    pub fn can_advance_to(&self, next: PlanStage) -> bool {
        use PlanStage::*;
        matches!(
            (self, next),
            (Received, Geocoded)
                | (Received, GeocodeFailed)
                | (Geocoded, ContextGathered)
                | (ContextGathered, Drafted)
                | (ContextGathered, DraftFailed)
                | (Drafted, Routed)
                | (Routed, Streaming)
                | (Routed, StreamFailed)
                | (Streaming, Done)
        )
    }
}

impl std::fmt::Display for PlanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current stage of one request, logging every transition.
#[derive(Debug)]
pub struct StageTracker {
    request_id: Uuid,
    stage: PlanStage,
}

impl StageTracker {
    pub fn new(request_id: Uuid) -> Self {
        info!(%request_id, stage = %PlanStage::Received, "plan request received");
        Self {
            request_id,
            stage: PlanStage::Received,
        }
    }

    pub fn stage(&self) -> PlanStage {
        self.stage
    }

    pub fn advance(&mut self, next: PlanStage) {
        if !self.stage.can_advance_to(next) {
            warn!(
                request_id = %self.request_id,
                from = %self.stage,
                to = %next,
                "unexpected stage transition"
            );
        }
        if next.is_failure() {
            error!(request_id = %self.request_id, from = %self.stage, stage = %next, "plan aborted");
        } else {
            info!(request_id = %self.request_id, from = %self.stage, stage = %next, "stage transition");
        }
        self.stage = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_legal() {
        let path = [
            PlanStage::Received,
            PlanStage::Geocoded,
            PlanStage::ContextGathered,
            PlanStage::Drafted,
            PlanStage::Routed,
            PlanStage::Streaming,
            PlanStage::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(PlanStage::Done.is_terminal());
    }

    #[test]
    fn test_failures_only_from_their_stage() {
        assert!(PlanStage::Received.can_advance_to(PlanStage::GeocodeFailed));
        assert!(!PlanStage::Geocoded.can_advance_to(PlanStage::GeocodeFailed));
        assert!(PlanStage::ContextGathered.can_advance_to(PlanStage::DraftFailed));
        assert!(!PlanStage::Streaming.can_advance_to(PlanStage::StreamFailed));
        assert!(!PlanStage::Done.can_advance_to(PlanStage::Streaming));
    }

    #[test]
    fn test_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&PlanStage::ContextGathered).unwrap(),
            "\"CONTEXT_GATHERED\""
        );
        assert_eq!(PlanStage::DraftFailed.to_string(), "DRAFT_FAILED");
    }

    #[test]
    fn test_tracker_follows_transitions() {
        let mut tracker = StageTracker::new(Uuid::new_v4());
        tracker.advance(PlanStage::Geocoded);
        tracker.advance(PlanStage::ContextGathered);
        assert_eq!(tracker.stage(), PlanStage::ContextGathered);
    }
}
