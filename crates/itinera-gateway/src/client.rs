//! Tool Gateway HTTP Client
//!
//! ## Authentication
//! - Header: `X-API-KEY: {MCP_SERVER_API_KEY}` on every request
//!
//! ## Behaviour
//! - One attempt per call, bounded by the configured timeout (15s default).
//! - Non-2xx responses become [`GatewayError::Status`], malformed bodies
//!   become [`GatewayError::Decode`], transport failures become
//!   [`GatewayError::Network`].

use async_trait::async_trait;
use itinera_core::{AppConfig, GeoResult, VenueCandidate};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dto::{
    endpoints, AirQualityResponse, EtaRequest, EtaResponse, ForecastResponse, GeocodeResponse,
    Holiday, HolidaysResponse, NearbyResponse,
};
use crate::error::{GatewayError, Result};

/// Search radius for nearby venues, in metres
pub const NEARBY_RADIUS_M: u32 = 5000;

/// Maximum venues returned per nearby search
pub const NEARBY_LIMIT: u32 = 15;

/// Operations the plan pipeline consumes from the tool gateway.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Resolve a city name to coordinates.
    async fn geocode(&self, city: &str) -> Result<GeoResult>;

    /// Daily forecast for a location.
    async fn forecast(&self, lat: f64, lon: f64, date: &str) -> Result<ForecastResponse>;

    /// Air quality for a location.
    async fn air_quality(&self, lat: f64, lon: f64, date: &str) -> Result<AirQualityResponse>;

    /// Venues around a location matching one query tag.
    async fn nearby_venues(
        &self,
        lat: f64,
        lon: f64,
        query: &str,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<VenueCandidate>>;

    /// Public holidays of a country for a year.
    async fn holidays(&self, country_code: &str, year: i32) -> Result<Vec<Holiday>>;

    /// Distance and duration along an ordered path.
    async fn eta(&self, request: &EtaRequest) -> Result<EtaResponse>;
}

/// reqwest-backed gateway client
pub struct GatewayClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GatewayClient {
    /// Create a client from the process configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_endpoint(
            &config.gateway_base_url,
            &config.gateway_api_key,
            config.gateway_timeout,
        )
    }

    /// Create with an explicit endpoint and timeout
    pub fn with_endpoint(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("X-API-KEY", &self.api_key)
            .header("Accept", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: &str, req: RequestBuilder) -> Result<T> {
        let response = req.send().await.map_err(|e| {
            let err = GatewayError::Network(e);
            if err.is_timeout() {
                warn!("Gateway call to {} timed out", endpoint);
            }
            err
        })?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw_body = response.text().await.map_err(GatewayError::Network)?;
        serde_json::from_str(&raw_body).map_err(|e| GatewayError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ToolGateway for GatewayClient {
    async fn geocode(&self, city: &str) -> Result<GeoResult> {
        info!("Gateway: geocoding city: {}", city);
        let req = self.get(endpoints::GEOCODE).query(&[("city", city)]);
        let response: GeocodeResponse = self.send(endpoints::GEOCODE, req).await?;
        Ok(response.into())
    }

    async fn forecast(&self, lat: f64, lon: f64, date: &str) -> Result<ForecastResponse> {
        info!("Gateway: getting forecast for {}", date);
        let req = self.get(endpoints::FORECAST).query(&[
            ("lat", format!("{:.6}", lat)),
            ("lon", format!("{:.6}", lon)),
            ("date", date.to_string()),
        ]);
        self.send(endpoints::FORECAST, req).await
    }

    async fn air_quality(&self, lat: f64, lon: f64, date: &str) -> Result<AirQualityResponse> {
        info!("Gateway: getting air quality for {}", date);
        let req = self.get(endpoints::AIR_QUALITY).query(&[
            ("lat", format!("{:.6}", lat)),
            ("lon", format!("{:.6}", lon)),
            ("date", date.to_string()),
        ]);
        self.send(endpoints::AIR_QUALITY, req).await
    }

    async fn nearby_venues(
        &self,
        lat: f64,
        lon: f64,
        query: &str,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<VenueCandidate>> {
        info!("Gateway: getting nearby venues for preference: {}", query);
        let req = self.get(endpoints::NEARBY).query(&[
            ("lat", format!("{:.6}", lat)),
            ("lon", format!("{:.6}", lon)),
            ("query", query.to_string()),
            ("radius", radius_m.to_string()),
            ("limit", limit.to_string()),
        ]);
        let response: NearbyResponse = self.send(endpoints::NEARBY, req).await?;
        debug!("Gateway: {} places for {}", response.places.len(), query);
        Ok(response.places.into_iter().map(Into::into).collect())
    }

    async fn holidays(&self, country_code: &str, year: i32) -> Result<Vec<Holiday>> {
        info!("Gateway: getting holidays for {} {}", country_code, year);
        let req = self.get(endpoints::HOLIDAYS).query(&[
            ("country", country_code.to_string()),
            ("year", year.to_string()),
        ]);
        let response: HolidaysResponse = self.send(endpoints::HOLIDAYS, req).await?;
        Ok(response.holidays)
    }

    async fn eta(&self, request: &EtaRequest) -> Result<EtaResponse> {
        info!(
            "Gateway: requesting {} route over {} points",
            request.profile,
            request.points.len()
        );
        let req = self.post(endpoints::ETA).json(request);
        self.send(endpoints::ETA, req).await
    }
}
