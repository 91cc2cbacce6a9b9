use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::error::WeatherError;
use crate::types::{AlertBundle, Coordinates, WeatherAlert};

const DEFAULT_BASE_URL: &str = "https://api.weather.gov";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
// The alerting service rejects requests without an identifying agent.
const USER_AGENT: &str = "Nimbus (weather@nimbus.example)";

/// Client for the National Weather Service active alerts API.
#[derive(Debug, Clone)]
pub struct AlertsClient {
    client: reqwest::Client,
    base_url: String,
}

impl AlertsClient {
    pub fn new() -> Self {
        Self::new_with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Fetches active alerts for a coordinate pair.
    ///
    /// Points outside US coverage are not an error: the service answers 404
    /// and this returns an empty bundle with an explanatory note.
    #[instrument(skip(self), level = "info")]
    pub async fn active_alerts(&self, coords: Coordinates) -> Result<AlertBundle, WeatherError> {
        if !coords.is_valid() {
            return Err(WeatherError::InvalidCoordinates {
                lat: coords.lat,
                lon: coords.lon,
            });
        }

        // The points endpoint rejects more than four decimal places.
        let point = format!(
            "{},{}",
            (coords.lat * 1e4).round() / 1e4,
            (coords.lon * 1e4).round() / 1e4
        );

        let points_url = format!("{}/points/{}", self.base_url, point);
        let response = self
            .client
            .get(&points_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(point = %point, "point outside alert coverage");
            return Ok(AlertBundle::outside_coverage());
        }
        let points: PointsResponse = self.handle_response(response).await?;

        let alerts_url = format!("{}/alerts/active", self.base_url);
        let response = self
            .client
            .get(&alerts_url)
            .query(&[("point", point.as_str())])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(AlertBundle::outside_coverage());
        }
        let data: AlertsResponse = self.handle_response(response).await?;

        let alerts: Vec<WeatherAlert> = data.features.into_iter().map(to_alert).collect();
        tracing::info!(count = alerts.len(), "fetched active alerts");

        Ok(AlertBundle {
            location: points.properties.display_location(),
            alert_count: alerts.len(),
            alerts,
            note: None,
        })
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let status = response.status();
        match status {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| WeatherError::Parse(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(WeatherError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(WeatherError::Api(format!("HTTP {status}: {body}")))
            }
        }
    }
}

impl Default for AlertsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_send_error(e: reqwest::Error) -> WeatherError {
    if e.is_timeout() {
        WeatherError::Timeout
    } else {
        WeatherError::Network(e)
    }
}

fn to_alert(feature: AlertFeature) -> WeatherAlert {
    let props = feature.properties;
    WeatherAlert {
        id: feature.id,
        title: props.event.unwrap_or_else(|| "Weather Alert".to_string()),
        headline: props.headline,
        description: props.description.unwrap_or_default(),
        instruction: props.instruction,
        severity: props.severity.unwrap_or_else(unknown),
        urgency: props.urgency.unwrap_or_else(unknown),
        certainty: props.certainty.unwrap_or_else(unknown),
        category: props.category.unwrap_or_else(unknown),
        onset: props.onset,
        ends: props.ends,
        expires: props.expires,
        sender: props
            .sender_name
            .unwrap_or_else(|| "National Weather Service".to_string()),
        status: props.status.unwrap_or_else(unknown),
        message_type: props.message_type.unwrap_or_else(unknown),
        areas: props.area_desc.unwrap_or_default(),
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    #[serde(default)]
    relative_location: Option<RelativeLocation>,
}

impl PointProperties {
    fn display_location(&self) -> String {
        let props = self.relative_location.as_ref().map(|r| &r.properties);
        let city = props
            .and_then(|p| p.city.as_deref())
            .unwrap_or("Unknown");
        let state = props
            .and_then(|p| p.state.as_deref())
            .unwrap_or("Unknown");
        format!("{city}, {state}")
    }
}

#[derive(Debug, Deserialize)]
struct RelativeLocation {
    properties: RelativeLocationProperties,
}

#[derive(Debug, Deserialize)]
struct RelativeLocationProperties {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
struct AlertFeature {
    id: String,
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertProperties {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instruction: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    urgency: Option<String>,
    #[serde(default)]
    certainty: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    onset: Option<DateTime<Utc>>,
    #[serde(default)]
    ends: Option<DateTime<Utc>>,
    #[serde(default)]
    expires: Option<DateTime<Utc>>,
    #[serde(default)]
    sender_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    area_desc: Option<String>,
}
