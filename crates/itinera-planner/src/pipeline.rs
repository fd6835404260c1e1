//! Plan pipeline
//!
//! One pipeline run per inbound request:
//! 1. geocode the city (fatal)
//! 2. gather weather, air quality and venues (degrading)
//! 3. pass 1: structured draft (fatal)
//! 4. pass 2: route ETA over the draft stops (degrading)
//! 5. pass 3: classify intent (advisory), open the narration stream (fatal)
//!
//! [`PlanPipeline::run`] returns once the stream is open, so every fatal
//! error is known before the first frame is produced.

use futures::{Stream, StreamExt};
use itinera_core::{placeholders, GeoResult, PlanRequest, DRAFT_STOP_TARGET};
use itinera_gateway::ToolGateway;
use itinera_llm::{GenerationService, TokenStream};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::context::{self, PlanContext};
use crate::error::PlanError;
use crate::frame::{Frame, TraceSummary};
use crate::prompts;
use crate::stage::{PlanStage, StageTracker};

pub struct PlanPipeline {
    gateway: Arc<dyn ToolGateway>,
    generator: Arc<dyn GenerationService>,
}

impl PlanPipeline {
    pub fn new(gateway: Arc<dyn ToolGateway>, generator: Arc<dyn GenerationService>) -> Self {
        Self { gateway, generator }
    }

    /// Run every stage up to an open narration stream.
    ///
    /// `cancel` is tied to the returned stream: dropping the stream, or
    /// cancelling the token, releases the upstream generation connection.
    pub async fn run(
        &self,
        request: &PlanRequest,
        cancel: CancellationToken,
    ) -> Result<PlanStream, PlanError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("plan", %request_id, city = %request.city, date = %request.date);
        self.run_stages(request_id, request, cancel)
            .instrument(span)
            .await
    }

    async fn run_stages(
        &self,
        request_id: Uuid,
        request: &PlanRequest,
        cancel: CancellationToken,
    ) -> Result<PlanStream, PlanError> {
        let mut tracker = StageTracker::new(request_id);

        let geo = match self.gateway.geocode(&request.city).await {
            Ok(geo) => geo,
            Err(e) => {
                tracker.advance(PlanStage::GeocodeFailed);
                return Err(PlanError::Geocode(e));
            }
        };
        info!("Geocoded {} to {} ({}, {})", request.city, geo.display_name, geo.latitude, geo.longitude);
        tracker.advance(PlanStage::Geocoded);

        let context = context::gather(self.gateway.as_ref(), &geo, request).await;
        info!("Context gathered with {} venues", context.venues.len());
        tracker.advance(PlanStage::ContextGathered);

        info!("--- PASS 1: Generating structured itinerary draft...");
        let draft_prompt = prompts::draft_prompt(request, &context);
        let mut draft = match self.generator.generate_structured_itinerary(&draft_prompt).await {
            Ok(draft) => draft,
            Err(e) => {
                tracker.advance(PlanStage::DraftFailed);
                return Err(PlanError::Draft(e));
            }
        };
        if draft.stops.len() > DRAFT_STOP_TARGET {
            warn!(
                "Draft returned {} stops, keeping the first {}",
                draft.stops.len(),
                DRAFT_STOP_TARGET
            );
            draft.stops.truncate(DRAFT_STOP_TARGET);
        }
        info!("Draft itinerary generated with {} stops", draft.stops.len());
        tracker.advance(PlanStage::Drafted);

        info!("--- PASS 2: Requesting travel times...");
        let route = context::route_summary(self.gateway.as_ref(), &draft).await;
        tracker.advance(PlanStage::Routed);

        info!("--- PASS 3: Synthesizing final plan and opening stream...");
        let final_prompt = prompts::final_prompt(&context, &route, &draft);
        let intent = self.classify(&final_prompt).await;

        let tokens = match self.generator.stream_plan(&final_prompt, cancel).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracker.advance(PlanStage::StreamFailed);
                return Err(PlanError::StreamInit(e));
            }
        };
        tracker.advance(PlanStage::Streaming);

        Ok(PlanStream {
            request_id,
            trace: trace_summary(intent, &geo, &context, route),
            tokens,
        })
    }

    /// Advisory intent label; a failure becomes `unknown`.
    async fn classify(&self, prompt: &str) -> String {
        match self.generator.classify_intent(prompt).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Intent classification failed: {}", e);
                placeholders::UNKNOWN_INTENT.to_string()
            }
        }
    }
}

fn trace_summary(intent: String, geo: &GeoResult, context: &PlanContext, route: String) -> TraceSummary {
    TraceSummary {
        intent,
        geocoded: geo.display_name.clone(),
        weather: context.weather.clone(),
        route,
    }
}

/// A plan whose narration stream is open.
#[derive(Debug)]
pub struct PlanStream {
    request_id: Uuid,
    trace: TraceSummary,
    tokens: TokenStream,
}

impl PlanStream {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn trace(&self) -> &TraceSummary {
        &self.trace
    }

    /// Trace frame, one frame per token in arrival order, then exactly one
    /// terminator. A stream that ends early is still terminated.
    pub fn into_frames(self) -> impl Stream<Item = Frame> + Send + 'static {
        let PlanStream {
            request_id,
            trace,
            mut tokens,
        } = self;

        async_stream::stream! {
            yield Frame::Trace(trace);

            let mut relayed = 0usize;
            while let Some(token) = tokens.next().await {
                relayed += 1;
                yield Frame::Token(token);
            }

            info!(%request_id, stage = %PlanStage::Done, tokens = relayed, "plan stream complete");
            yield Frame::End;
        }
    }
}
