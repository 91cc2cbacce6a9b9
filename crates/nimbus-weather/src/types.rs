use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Measurement system requested from the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// Value for the provider's `units` query parameter.
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
        }
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Checks that both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Rounds to six decimal places for upstream requests.
    pub fn rounded(&self) -> Self {
        Self {
            lat: (self.lat * 1e6).round() / 1e6,
            lon: (self.lon * 1e6).round() / 1e6,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// Current observed conditions for a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// Display label, e.g. "Paris, FR".
    pub location: String,
    /// Exact reading from the provider, not rounded.
    pub temperature: f64,
    pub temperature_rounded: i32,
    pub feels_like: f64,
    pub feels_like_rounded: i32,
    /// Rothfusz heat index, only computed for imperial readings of 80°F or above.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_index: Option<f64>,
    pub humidity: f64,
    pub pressure: f64,
    /// Wind speed rounded to one decimal place.
    pub wind_speed: f64,
    /// Sixteen-point compass label, e.g. "NNW".
    pub wind_direction: String,
    /// Visibility converted to whole miles, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_miles: Option<u32>,
    pub description: String,
    pub condition: String,
    pub icon: String,
    pub observed_at: DateTime<Utc>,
    pub coordinates: Coordinates,
}

/// A single forecast step (three-hour resolution upstream).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub temperature_rounded: i32,
    pub feels_like: f64,
    pub description: String,
    pub condition: String,
    pub icon: String,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Probability of precipitation as a whole percentage.
    pub precipitation_chance: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub location: String,
    pub periods: Vec<ForecastPeriod>,
}

/// An active alert issued by the national alerting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    pub severity: String,
    pub urgency: String,
    pub certainty: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    pub sender: String,
    pub status: String,
    pub message_type: String,
    pub areas: String,
}

/// Active alerts for a point, possibly empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBundle {
    pub location: String,
    pub alert_count: usize,
    pub alerts: Vec<WeatherAlert>,
    /// Set when the point is outside the alerting service's coverage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AlertBundle {
    /// Bundle for a point the alerting service does not cover.
    pub fn outside_coverage() -> Self {
        Self {
            location: "Outside US Coverage".to_string(),
            alert_count: 0,
            alerts: Vec::new(),
            note: Some("NWS alerts only available for US locations".to_string()),
        }
    }
}

/// Everything the aggregator gathered for one request.
///
/// Absent sections were either not requested or failed upstream. When every
/// requested section is missing, `unavailable` explains why.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<AlertBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,
}

impl WeatherSnapshot {
    /// True when the snapshot carries conditions or a forecast.
    pub fn has_conditions(&self) -> bool {
        self.current.is_some() || self.forecast.is_some()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.as_ref().map_or(0, |a| a.alert_count)
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Converts wind degrees to a sixteen-point compass label.
pub fn compass_direction(degrees: f64) -> &'static str {
    let index = ((degrees / 22.5).round() as isize).rem_euclid(16) as usize;
    COMPASS_POINTS[index]
}

/// Converts meters to whole miles, matching how visibility is reported.
pub fn meters_to_miles(meters: f64) -> u32 {
    (meters * 0.000_621_371).round().max(0.0) as u32
}

/// Rothfusz heat index regression. Input and output in °F.
///
/// Below 80°F the index is not meaningful and the input temperature is
/// returned unchanged.
pub fn heat_index(temp_f: f64, humidity: f64) -> f64 {
    if temp_f < 80.0 {
        return temp_f;
    }

    let t = temp_f;
    let h = humidity;

    let simple = 0.5 * (t + 61.0 + (t - 68.0) * 1.2 + h * 0.094);
    if simple < 80.0 {
        return simple.round();
    }

    let hi = -42.379 + 2.049_015_23 * t + 10.143_331_27 * h
        - 0.224_755_41 * t * h
        - 0.006_837_83 * t * t
        - 0.054_817_17 * h * h
        + 0.001_228_74 * t * t * h
        + 0.000_852_82 * t * h * h
        - 0.000_001_99 * t * t * h * h;

    hi.round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_query_value() {
        assert_eq!(Units::Imperial.query_value(), "imperial");
        assert_eq!(Units::Metric.query_value(), "metric");
        assert_eq!(Units::default(), Units::Imperial);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinates::new(48.8566, 2.3522).is_valid());
        assert!(Coordinates::new(0.0, 0.0).is_valid());
        assert!(Coordinates::new(-90.0, 180.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_coordinate_rounding() {
        let c = Coordinates::new(40.712_775_123, -74.005_972_987).rounded();
        assert_eq!(c.lat, 40.712_775);
        assert_eq!(c.lon, -74.005_973);
    }

    #[test]
    fn test_compass_direction() {
        assert_eq!(compass_direction(0.0), "N");
        assert_eq!(compass_direction(90.0), "E");
        assert_eq!(compass_direction(180.0), "S");
        assert_eq!(compass_direction(270.0), "W");
        assert_eq!(compass_direction(22.5), "NNE");
        assert_eq!(compass_direction(337.5), "NNW");
        // Wraps back to north near 360.
        assert_eq!(compass_direction(355.0), "N");
    }

    #[test]
    fn test_meters_to_miles() {
        assert_eq!(meters_to_miles(10_000.0), 6);
        assert_eq!(meters_to_miles(1_609.34), 1);
        assert_eq!(meters_to_miles(0.0), 0);
    }

    #[test]
    fn test_heat_index_below_threshold_is_identity() {
        assert_eq!(heat_index(72.0, 90.0), 72.0);
        assert_eq!(heat_index(79.9, 100.0), 79.9);
    }

    #[test]
    fn test_heat_index_hot_humid() {
        // 96°F at 65% humidity is a textbook dangerous combination.
        let hi = heat_index(96.0, 65.0);
        assert!(hi > 115.0 && hi < 130.0, "unexpected heat index {hi}");
        assert_eq!(hi, hi.round());
    }

    #[test]
    fn test_snapshot_helpers() {
        let empty = WeatherSnapshot::default();
        assert!(!empty.has_conditions());
        assert_eq!(empty.alert_count(), 0);

        let with_alerts = WeatherSnapshot {
            alerts: Some(AlertBundle {
                location: "Denver, CO".to_string(),
                alert_count: 2,
                alerts: Vec::new(),
                note: None,
            }),
            ..Default::default()
        };
        assert!(!with_alerts.has_conditions());
        assert_eq!(with_alerts.alert_count(), 2);
    }

    #[test]
    fn test_outside_coverage_bundle() {
        let bundle = AlertBundle::outside_coverage();
        assert_eq!(bundle.alert_count, 0);
        assert!(bundle.alerts.is_empty());
        assert!(bundle.note.as_deref().is_some_and(|n| n.contains("US")));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = WeatherSnapshot {
            unavailable: Some("upstream failure".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["unavailable"], "upstream failure");
        assert!(json.get("current").is_none());
    }
}
