//! Domain types shared by the gateway client, the generation client and the
//! plan pipeline.

use serde::{Deserialize, Serialize};

/// Number of stops the draft pass asks the model to select.
pub const DRAFT_STOP_TARGET: usize = 4;

/// Preference tag that modifies the plan instead of naming a venue category.
pub const WALKABLE_TAG: &str = "walkable";

/// Fixed texts substituted when a non-fatal upstream call fails.
pub mod placeholders {
    pub const WEATHER_UNAVAILABLE: &str = "Weather data unavailable.";
    pub const AIR_QUALITY_UNAVAILABLE: &str = "Air quality data unavailable.";
    pub const NO_VENUES: &str = "No nearby venues found based on preferences.";
    pub const ROUTE_UNAVAILABLE: &str = "Travel times are unavailable due to an API error.";
    pub const UNKNOWN_INTENT: &str = "unknown";
}

/// Inbound travel-planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub city: String,
    pub date: String,
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl PlanRequest {
    pub fn new(city: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            date: date.into(),
            preferences: Vec::new(),
        }
    }

    pub fn with_preferences<I, S>(mut self, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences = preferences.into_iter().map(Into::into).collect();
        self
    }

    /// Preference tags that should be issued as venue searches, in request
    /// order: trimmed, non-empty, and not the `walkable` modifier.
    pub fn venue_queries(&self) -> Vec<&str> {
        self.preferences
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty() && *p != WALKABLE_TAG)
            .collect()
    }
}

/// Geocoded city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// A venue returned by a nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueCandidate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl VenueCandidate {
    /// One line of the venue list embedded in the draft prompt.
    pub fn render(&self) -> String {
        format!("- {} ({:.6}, {:.6})", self.name, self.latitude, self.longitude)
    }
}

/// One stop of a draft itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftStop {
    pub name: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
    pub start_time: String,
}

/// Structured itinerary produced by the draft pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftItinerary {
    #[serde(default)]
    pub stops: Vec<DraftStop>,
}

impl DraftItinerary {
    /// Ordered coordinates of the stops, for the routing call.
    pub fn route_points(&self) -> Vec<RoutePoint> {
        self.stops
            .iter()
            .map(|s| RoutePoint {
                lat: s.latitude,
                lon: s.longitude,
            })
            .collect()
    }

    /// Pretty JSON rendering used as supporting context in the final prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// A point on a route, in the gateway's wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_queries_skip_walkable_and_blank() {
        let request = PlanRequest::new("Kyoto", "2025-12-12")
            .with_preferences([" temples ", "walkable", "", "coffee"]);
        assert_eq!(request.venue_queries(), vec!["temples", "coffee"]);
    }

    #[test]
    fn test_preferences_default_to_empty() {
        let request: PlanRequest =
            serde_json::from_str(r#"{"city":"Kyoto","date":"2025-12-12"}"#).unwrap();
        assert!(request.preferences.is_empty());
        assert!(request.venue_queries().is_empty());
    }

    #[test]
    fn test_draft_stop_accepts_short_coordinate_names() {
        let draft: DraftItinerary = serde_json::from_str(
            r#"{"stops":[{"name":"Kiyomizu-dera","lat":34.99,"lon":135.78,"start_time":"10:00"}]}"#,
        )
        .unwrap();
        assert_eq!(draft.stops[0].latitude, 34.99);
        assert_eq!(
            draft.route_points(),
            vec![RoutePoint { lat: 34.99, lon: 135.78 }]
        );
    }

    #[test]
    fn test_venue_render() {
        let venue = VenueCandidate {
            name: "Fushimi Inari".to_string(),
            latitude: 34.967146,
            longitude: 135.772695,
        };
        assert_eq!(venue.render(), "- Fushimi Inari (34.967146, 135.772695)");
    }
}
