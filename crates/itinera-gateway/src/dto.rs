//! Gateway wire types
//!
//! | Endpoint | Method | Response |
//! |----------|--------|----------|
//! | `/mcp/geo/geocode` | GET | [`GeocodeResponse`] |
//! | `/mcp/weather/forecast` | GET | [`ForecastResponse`] |
//! | `/mcp/air/aqi` | GET | [`AirQualityResponse`] |
//! | `/mcp/geo/nearby` | GET | [`NearbyResponse`] |
//! | `/mcp/calendar/holidays` | GET | [`HolidaysResponse`] |
//! | `/mcp/route/eta` | POST [`EtaRequest`] | [`EtaResponse`] |

use itinera_core::{GeoResult, RoutePoint, VenueCandidate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gateway endpoint paths
pub mod endpoints {
    pub const GEOCODE: &str = "/mcp/geo/geocode";
    pub const FORECAST: &str = "/mcp/weather/forecast";
    pub const AIR_QUALITY: &str = "/mcp/air/aqi";
    pub const NEARBY: &str = "/mcp/geo/nearby";
    pub const HOLIDAYS: &str = "/mcp/calendar/holidays";
    pub const ETA: &str = "/mcp/route/eta";
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeocodeResponse {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

impl From<GeocodeResponse> for GeoResult {
    fn from(r: GeocodeResponse) -> Self {
        GeoResult {
            latitude: r.lat,
            longitude: r.lon,
            display_name: r.display_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NearbyPlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tags: HashMap<String, serde_json::Value>,
}

impl From<NearbyPlace> for VenueCandidate {
    fn from(p: NearbyPlace) -> Self {
        VenueCandidate {
            name: p.name,
            latitude: p.lat,
            longitude: p.lon,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NearbyResponse {
    #[serde(default)]
    pub places: Vec<NearbyPlace>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForecastResponse {
    pub temp_c: f64,
    pub precip_prob: f64,
    #[serde(default)]
    pub wind_kph: f64,
    #[serde(default)]
    pub summary: String,
}

impl ForecastResponse {
    pub fn summary_text(&self) -> String {
        format!(
            "Max Temp: {:.1}°C (Precip Prob: {:.0}%)",
            self.temp_c, self.precip_prob
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirQualityResponse {
    pub pm25: f64,
    pub pm10: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub o3: f64,
    pub category: String,
}

impl AirQualityResponse {
    pub fn summary_text(&self) -> String {
        format!(
            "PM2.5: {:.1} µg/m³, PM10: {:.1} µg/m³, Category: {}",
            self.pm25, self.pm10, self.category
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Holiday {
    pub date: String,
    pub name: String,
    #[serde(default)]
    pub local_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HolidaysResponse {
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

/// Travel profile understood by the routing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelProfile {
    Car,
}

impl std::fmt::Display for TravelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TravelProfile::Car => write!(f, "car"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaRequest {
    pub profile: TravelProfile,
    pub points: Vec<RoutePoint>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EtaResponse {
    pub distance_km: f64,
    pub duration_min: f64,
    #[serde(default)]
    pub polyline: String,
}

impl EtaResponse {
    pub fn summary_text(&self) -> String {
        format!(
            "Travel distance: {:.1} km, Duration: {:.1} min.",
            self.distance_km, self.duration_min
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_texts() {
        let forecast = ForecastResponse {
            temp_c: 11.26,
            precip_prob: 40.4,
            wind_kph: 8.0,
            summary: String::new(),
        };
        assert_eq!(forecast.summary_text(), "Max Temp: 11.3°C (Precip Prob: 40%)");

        let aqi = AirQualityResponse {
            pm25: 8.04,
            pm10: 15.0,
            no2: 0.0,
            o3: 0.0,
            category: "Good".to_string(),
        };
        assert_eq!(
            aqi.summary_text(),
            "PM2.5: 8.0 µg/m³, PM10: 15.0 µg/m³, Category: Good"
        );

        let eta = EtaResponse {
            distance_km: 12.34,
            duration_min: 41.06,
            polyline: String::new(),
        };
        assert_eq!(eta.summary_text(), "Travel distance: 12.3 km, Duration: 41.1 min.");
    }

    #[test]
    fn test_eta_request_wire_shape() {
        let req = EtaRequest {
            profile: TravelProfile::Car,
            points: vec![RoutePoint { lat: 1.0, lon: 2.0 }],
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"profile": "car", "points": [{"lat": 1.0, "lon": 2.0}]})
        );
    }

    #[test]
    fn test_forecast_optional_fields() {
        let forecast: ForecastResponse =
            serde_json::from_str(r#"{"temp_c": 10.0, "precip_prob": 5.0}"#).unwrap();
        assert_eq!(forecast.wind_kph, 0.0);
        assert!(forecast.summary.is_empty());
    }
}
