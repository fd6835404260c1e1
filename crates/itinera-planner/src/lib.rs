//! itinera-planner: Plan Pipeline
//!
//! Sequences the gateway and generation clients into a narrated day plan:
//! geocode, gather context, draft, route, then stream. Fatal failures are
//! returned as [`PlanError`] before any output frame; degraded context calls
//! are replaced by placeholder text.

pub mod context;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod prompts;
pub mod stage;

pub use context::PlanContext;
pub use error::PlanError;
pub use frame::{Frame, TraceSummary, END_MARKER};
pub use pipeline::{PlanPipeline, PlanStream};
pub use stage::PlanStage;
