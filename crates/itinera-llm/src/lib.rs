//! itinera-llm: Generation Service
//!
//! Gemini-backed text generation for the plan pipeline:
//! - intent classification (few-shot prompt, one-shot call)
//! - structured draft itinerary (JSON with a response schema)
//! - plan narration as an incremental token stream
//!
//! ## Environment Variables
//!
//! ```bash
//! GEMINI_API_KEY=xxx
//! GEMINI_MODEL=gemini-2.5-flash   # optional
//! ```

pub mod error;
pub mod gemini;
pub mod intent;
pub mod provider;
pub mod stream;

pub use error::{GenerationError, Result};
pub use gemini::GeminiClient;
pub use intent::INTENT_LABELS;
pub use provider::GenerationService;
pub use stream::TokenStream;
