//! Context gathering
//!
//! Every call here degrades: a failure is logged at `warn` and replaced by
//! a fixed placeholder, so the pipeline always moves on.

use itinera_core::{placeholders, DraftItinerary, GeoResult, PlanRequest, VenueCandidate};
use itinera_gateway::{EtaRequest, ToolGateway, TravelProfile, NEARBY_LIMIT, NEARBY_RADIUS_M};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Travel profile used for the routing pass.
pub const ROUTE_PROFILE: TravelProfile = TravelProfile::Car;

/// Weather, air quality and venues around the geocoded city.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanContext {
    pub weather: String,
    pub air_quality: String,
    pub venues: Vec<VenueCandidate>,
}

impl PlanContext {
    /// Rendered venue list for the draft prompt, or the no-venues placeholder.
    pub fn venue_list(&self) -> String {
        if self.venues.is_empty() {
            return placeholders::NO_VENUES.to_string();
        }
        self.venues
            .iter()
            .map(VenueCandidate::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Gather weather, air quality and venues concurrently.
pub async fn gather(gateway: &dyn ToolGateway, geo: &GeoResult, request: &PlanRequest) -> PlanContext {
    let queries = request.venue_queries();
    let (weather, air_quality, venues) = tokio::join!(
        weather_summary(gateway, geo, &request.date),
        air_quality_summary(gateway, geo, &request.date),
        nearby_venues(gateway, geo, &queries),
    );

    PlanContext {
        weather,
        air_quality,
        venues,
    }
}

pub async fn weather_summary(gateway: &dyn ToolGateway, geo: &GeoResult, date: &str) -> String {
    match gateway.forecast(geo.latitude, geo.longitude, date).await {
        Ok(forecast) => forecast.summary_text(),
        Err(e) => {
            warn!("Failed to get weather: {}", e);
            placeholders::WEATHER_UNAVAILABLE.to_string()
        }
    }
}

pub async fn air_quality_summary(gateway: &dyn ToolGateway, geo: &GeoResult, date: &str) -> String {
    match gateway.air_quality(geo.latitude, geo.longitude, date).await {
        Ok(aqi) => aqi.summary_text(),
        Err(e) => {
            warn!("Failed to get air quality: {}", e);
            placeholders::AIR_QUALITY_UNAVAILABLE.to_string()
        }
    }
}

/// One nearby search per query, in order, merged by venue name.
///
/// The first occurrence of a name wins; a failed query contributes nothing.
pub async fn nearby_venues(
    gateway: &dyn ToolGateway,
    geo: &GeoResult,
    queries: &[&str],
) -> Vec<VenueCandidate> {
    let mut seen = HashSet::new();
    let mut venues = Vec::new();

    for query in queries {
        debug!("Getting nearby venues for preference: {}", query);
        let found = match gateway
            .nearby_venues(geo.latitude, geo.longitude, query, NEARBY_RADIUS_M, NEARBY_LIMIT)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!("Failed to get nearby venues for {}: {}", query, e);
                continue;
            }
        };

        for venue in found {
            if seen.insert(venue.name.clone()) {
                venues.push(venue);
            }
        }
    }

    venues
}

/// Distance/duration summary over the draft's stops, or the route placeholder.
pub async fn route_summary(gateway: &dyn ToolGateway, draft: &DraftItinerary) -> String {
    let request = EtaRequest {
        profile: ROUTE_PROFILE,
        points: draft.route_points(),
    };

    match gateway.eta(&request).await {
        Ok(eta) => eta.summary_text(),
        Err(e) => {
            warn!("Failed route ETA call: {}", e);
            placeholders::ROUTE_UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_list_placeholder() {
        let context = PlanContext {
            weather: String::new(),
            air_quality: String::new(),
            venues: vec![],
        };
        assert_eq!(context.venue_list(), placeholders::NO_VENUES);
    }

    #[test]
    fn test_venue_list_rendering() {
        let context = PlanContext {
            weather: String::new(),
            air_quality: String::new(),
            venues: vec![
                VenueCandidate {
                    name: "Kinkaku-ji".to_string(),
                    latitude: 35.0394,
                    longitude: 135.7292,
                },
                VenueCandidate {
                    name: "Ginkaku-ji".to_string(),
                    latitude: 35.027,
                    longitude: 135.798,
                },
            ],
        };
        assert_eq!(
            context.venue_list(),
            "- Kinkaku-ji (35.039400, 135.729200)\n- Ginkaku-ji (35.027000, 135.798000)"
        );
    }

    struct QueryLog(std::sync::Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl ToolGateway for QueryLog {
        async fn geocode(&self, _city: &str) -> itinera_gateway::Result<GeoResult> {
            unreachable!()
        }

        async fn forecast(
            &self,
            _lat: f64,
            _lon: f64,
            _date: &str,
        ) -> itinera_gateway::Result<itinera_gateway::ForecastResponse> {
            Err(itinera_gateway::GatewayError::InvalidUrl("offline".to_string()))
        }

        async fn air_quality(
            &self,
            _lat: f64,
            _lon: f64,
            _date: &str,
        ) -> itinera_gateway::Result<itinera_gateway::AirQualityResponse> {
            Err(itinera_gateway::GatewayError::InvalidUrl("offline".to_string()))
        }

        async fn nearby_venues(
            &self,
            lat: f64,
            lon: f64,
            query: &str,
            _radius_m: u32,
            _limit: u32,
        ) -> itinera_gateway::Result<Vec<VenueCandidate>> {
            self.0.lock().unwrap().push(query.to_string());
            Ok(vec![VenueCandidate {
                name: "Shared".to_string(),
                latitude: lat,
                longitude: lon,
            }])
        }

        async fn holidays(
            &self,
            _country_code: &str,
            _year: i32,
        ) -> itinera_gateway::Result<Vec<itinera_gateway::Holiday>> {
            unreachable!()
        }

        async fn eta(&self, _request: &EtaRequest) -> itinera_gateway::Result<itinera_gateway::EtaResponse> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_gather_queries_trimmed_preferences_and_degrades() {
        let gateway = QueryLog(Default::default());
        let geo = GeoResult {
            latitude: 35.0,
            longitude: 135.7,
            display_name: "Kyoto".to_string(),
        };
        let request = PlanRequest::new("Kyoto", "2025-12-12")
            .with_preferences([" temples ", "walkable", "gardens"]);

        let context = gather(&gateway, &geo, &request).await;

        assert_eq!(*gateway.0.lock().unwrap(), vec!["temples", "gardens"]);
        assert_eq!(context.venues.len(), 1);
        assert_eq!(context.weather, placeholders::WEATHER_UNAVAILABLE);
        assert_eq!(context.air_quality, placeholders::AIR_QUALITY_UNAVAILABLE);
    }
}
