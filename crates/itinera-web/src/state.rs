//! Application State

use anyhow::Context;
use itinera_core::AppConfig;
use itinera_gateway::{GatewayClient, ToolGateway};
use itinera_llm::{GeminiClient, GenerationService};
use itinera_planner::PlanPipeline;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Application state shared across all handlers
pub struct AppState {
    pub pipeline: Arc<PlanPipeline>,
    /// Generation model identifier
    pub model: String,
    /// Upper bound for producing a response head
    pub request_timeout: Duration,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        info!("Initializing application state...");

        let gateway = GatewayClient::new(config).context("failed to build tool gateway client")?;
        info!("Tool gateway: {}", gateway.base_url());

        let generator = GeminiClient::from_config(config);
        info!("Generation model: {} ({})", generator.model(), generator.api_url());

        Ok(Self::with_services(Arc::new(gateway), Arc::new(generator))
            .with_request_timeout(config.stream_timeout))
    }

    /// Build state around already constructed clients.
    pub fn with_services(
        gateway: Arc<dyn ToolGateway>,
        generator: Arc<dyn GenerationService>,
    ) -> Self {
        let model = generator.model().to_string();
        Self {
            pipeline: Arc::new(PlanPipeline::new(gateway, generator)),
            model,
            request_timeout: Duration::from_secs(itinera_core::config::DEFAULT_STREAM_TIMEOUT_SECS),
            start_time: Instant::now(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
