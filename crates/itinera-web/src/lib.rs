//! itinera-web: HTTP front end
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/` | liveness JSON |
//! | GET | `/api/health` | status, version, model, uptime |
//! | POST | `/api/v1/plan` | `text/event-stream` plan, or a JSON error |

pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
