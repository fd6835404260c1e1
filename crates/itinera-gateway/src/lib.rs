//! itinera-gateway: Tool Gateway Client
//!
//! Typed wrapper around the geo/weather/routing gateway. Every operation is a
//! single HTTP call with the static `X-API-KEY` credential and a short
//! timeout; nothing is cached or retried.
//!
//! ## Environment Variables
//!
//! ```bash
//! MCP_SERVER_BASE_URL=https://gateway.example.com
//! MCP_SERVER_API_KEY=xxx
//! ```

pub mod client;
pub mod dto;
pub mod error;

pub use client::{GatewayClient, ToolGateway, NEARBY_LIMIT, NEARBY_RADIUS_M};
pub use dto::{
    AirQualityResponse, EtaRequest, EtaResponse, ForecastResponse, Holiday, TravelProfile,
};
pub use error::{GatewayError, Result};
