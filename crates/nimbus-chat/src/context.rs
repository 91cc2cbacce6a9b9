//! Per-request orchestration context.
//!
//! The context is assembled once per turn, serialized into the system
//! prompt so the model can see exactly what was gathered, and mirrored
//! back to the client in the reply.

use chrono::{DateTime, Utc};
use serde::Serialize;

use nimbus_geo::ResolvedLocation;
use nimbus_weather::{Coordinates, WeatherSnapshot};

use crate::intent::Intent;
use crate::types::ChatRequest;

/// Where the coordinates used for weather data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationSource {
    ExtractedFromText,
    DeviceGeolocation,
    None,
}

/// Everything known about one turn after orchestration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationContext {
    pub user_message: String,
    pub intent: Intent,
    pub location_source: LocationSource,
    /// The candidate text pulled out of the message, when resolution ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searched_location: Option<String>,
    /// Display name of the place the data describes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// True when text-derived coordinates overrode the device location.
    pub has_location_switch: bool,
    /// True when weather was wanted but no usable coordinates existed.
    pub needs_location: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Gathered weather sections, merged into the context at the top
    /// level.
    #[serde(flatten)]
    pub weather: Option<WeatherSnapshot>,
    pub timestamp: DateTime<Utc>,
}

/// Assembles the context for one turn. Pure: the caller supplies the
/// timestamp, so identical inputs produce identical contexts.
///
/// A location extracted from the message text always wins over device
/// coordinates; the device is the fallback, labeled "your current
/// location" since it has no display name.
pub fn assemble(
    request: &ChatRequest,
    intent: Intent,
    resolved: Option<&ResolvedLocation>,
    searched: Option<String>,
    weather: Option<WeatherSnapshot>,
    error: Option<String>,
    timestamp: DateTime<Utc>,
) -> OrchestrationContext {
    let device = request.location;
    let coordinates = resolved.map(|r| Coordinates::new(r.lat, r.lon)).or(device);

    let location_source = if resolved.is_some() {
        LocationSource::ExtractedFromText
    } else if device.is_some() {
        LocationSource::DeviceGeolocation
    } else {
        LocationSource::None
    };

    let location_used = resolved
        .map(|r| r.display_name.clone())
        .or_else(|| device.map(|_| "your current location".to_string()));

    OrchestrationContext {
        user_message: request.message.clone(),
        intent,
        location_source,
        searched_location: searched,
        location_used,
        coordinates,
        has_location_switch: resolved.is_some() && device.is_some(),
        needs_location: intent.wants_weather_data
            && !intent.is_educational
            && coordinates.is_none(),
        error,
        weather,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::classify;
    use nimbus_geo::extract_location;
    use nimbus_weather::AlertBundle;

    fn intent_for(message: &str) -> Intent {
        classify(message, extract_location(message).as_ref())
    }

    fn denver() -> ResolvedLocation {
        ResolvedLocation {
            name: "Denver".to_string(),
            state: Some("Colorado".to_string()),
            country: "US".to_string(),
            lat: 39.7392,
            lon: -104.9847,
            display_name: "Denver, Colorado, USA".to_string(),
            relevance: 100,
        }
    }

    #[test]
    fn test_extracted_location_wins_over_device() {
        let mut request = ChatRequest::new("weather in denver");
        request.location = Some(Coordinates::new(47.6, -122.3));

        let context = assemble(
            &request,
            intent_for("weather in denver"),
            Some(&denver()),
            Some("denver".to_string()),
            None,
            None,
            Utc::now(),
        );

        assert_eq!(context.location_source, LocationSource::ExtractedFromText);
        assert_eq!(context.coordinates.unwrap().lat, 39.7392);
        assert_eq!(context.location_used.as_deref(), Some("Denver, Colorado, USA"));
        assert!(context.has_location_switch);
        assert!(!context.needs_location);
    }

    #[test]
    fn test_device_fallback_gets_generic_label() {
        let mut request = ChatRequest::new("how hot is it?");
        request.location = Some(Coordinates::new(47.6, -122.3));

        let context = assemble(
            &request,
            intent_for("how hot is it?"),
            None,
            None,
            None,
            None,
            Utc::now(),
        );

        assert_eq!(context.location_source, LocationSource::DeviceGeolocation);
        assert_eq!(context.location_used.as_deref(), Some("your current location"));
        assert!(!context.has_location_switch);
    }

    #[test]
    fn test_needs_location_when_weather_wanted_without_coordinates() {
        let request = ChatRequest::new("what's the temperature?");

        let context = assemble(
            &request,
            intent_for("what's the temperature?"),
            None,
            None,
            None,
            None,
            Utc::now(),
        );

        assert_eq!(context.location_source, LocationSource::None);
        assert!(context.needs_location);
        assert!(context.location_used.is_none());
    }

    #[test]
    fn test_educational_turn_never_needs_location() {
        let request = ChatRequest::new("explain what wind shear does to storms");

        let context = assemble(
            &request,
            intent_for("explain what wind shear does to storms"),
            None,
            None,
            None,
            None,
            Utc::now(),
        );

        assert!(context.intent.is_educational);
        assert!(!context.needs_location);
    }

    #[test]
    fn test_serializes_camel_case_with_flattened_weather() {
        let request = ChatRequest::new("alerts for denver");
        let snapshot = WeatherSnapshot {
            alerts: Some(AlertBundle {
                location: "Denver, Colorado".to_string(),
                alert_count: 1,
                alerts: Vec::new(),
                note: None,
            }),
            ..WeatherSnapshot::default()
        };

        let context = assemble(
            &request,
            intent_for("alerts for denver"),
            Some(&denver()),
            Some("denver".to_string()),
            Some(snapshot),
            None,
            Utc::now(),
        );
        let json = serde_json::to_value(&context).unwrap();

        assert_eq!(json["locationSource"], "extracted-from-text");
        assert_eq!(json["locationUsed"], "Denver, Colorado, USA");
        // Snapshot sections sit at the top level of the context.
        assert_eq!(json["alerts"]["alertCount"], 1);
        assert!(json.get("current").is_none());
        assert!(json.get("weather").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_identical_inputs_produce_identical_context() {
        let request = ChatRequest::new("weather in denver");
        let at = Utc::now();
        let build = || {
            assemble(
                &request,
                intent_for("weather in denver"),
                Some(&denver()),
                Some("denver".to_string()),
                None,
                None,
                at,
            )
        };

        let first = serde_json::to_value(build()).unwrap();
        let second = serde_json::to_value(build()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_weather_emits_no_section_keys() {
        let request = ChatRequest::new("hello");
        let context = assemble(&request, intent_for("hello"), None, None, None, None, Utc::now());
        let json = serde_json::to_value(&context).unwrap();

        assert!(json.get("current").is_none());
        assert!(json.get("forecast").is_none());
        assert!(json.get("alerts").is_none());
        assert_eq!(json["locationSource"], "none");
    }
}
