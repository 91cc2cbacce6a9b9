use std::time::Duration;

use tracing::instrument;

use crate::alerts::AlertsClient;
use crate::client::WeatherClient;
use crate::error::WeatherError;
use crate::types::{AlertBundle, Coordinates, CurrentConditions, Forecast, WeatherSnapshot};

/// Which sections of a snapshot a request needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchPlan {
    pub current: bool,
    pub forecast: bool,
    pub alerts: bool,
}

impl FetchPlan {
    pub fn is_empty(&self) -> bool {
        !self.current && !self.forecast && !self.alerts
    }
}

/// Retry behavior for the aggregation loop.
///
/// Only a failed current-conditions fetch triggers a retry; forecast and
/// alert fetches get one attempt regardless of outcome.
#[derive(Debug, Clone)]
pub struct AggregatePolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for AggregatePolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Fans a fetch plan out to the upstream clients and settles all of them.
#[derive(Debug, Clone)]
pub struct WeatherAggregator {
    weather: WeatherClient,
    alerts: AlertsClient,
    policy: AggregatePolicy,
}

struct AttemptOutcome {
    current: Option<Result<CurrentConditions, WeatherError>>,
    forecast: Option<Result<Forecast, WeatherError>>,
    alerts: Option<Result<AlertBundle, WeatherError>>,
}

impl WeatherAggregator {
    pub fn new(weather: WeatherClient, alerts: AlertsClient, policy: AggregatePolicy) -> Self {
        Self {
            weather,
            alerts,
            policy,
        }
    }

    /// Fetches every section the plan asks for, concurrently, and never
    /// fails: sections that could not be fetched are simply absent, with
    /// `unavailable` explaining the gap when nothing was gathered at all
    /// or current conditions stayed down through the retry budget. An
    /// empty plan skips the upstream calls and reports that nothing was
    /// requested, so an all-empty snapshot always carries a reason.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, coords: Coordinates, plan: FetchPlan) -> WeatherSnapshot {
        if plan.is_empty() {
            tracing::debug!("fetch plan requests no sections");
            return WeatherSnapshot {
                unavailable: Some("no weather sections requested".to_string()),
                ..WeatherSnapshot::default()
            };
        }

        let mut outcome = self.attempt(coords, plan).await;

        let mut attempt = 0u32;
        while plan.current
            && matches!(outcome.current, Some(Err(_)))
            && attempt < self.policy.max_retries
        {
            attempt += 1;
            tracing::warn!(
                attempt,
                max_retries = self.policy.max_retries,
                "current conditions failed, retrying aggregation"
            );
            tokio::time::sleep(self.policy.retry_delay).await;
            outcome = self.attempt(coords, plan).await;
        }

        let mut first_error: Option<String> = None;
        let mut record = |e: &WeatherError| {
            if first_error.is_none() {
                first_error = Some(e.to_string());
            }
        };

        let current = match outcome.current {
            Some(Ok(current)) => Some(current),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "current conditions unavailable after retries");
                record(&e);
                None
            }
            None => None,
        };
        let forecast = match outcome.forecast {
            Some(Ok(forecast)) => Some(forecast),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "forecast unavailable");
                record(&e);
                None
            }
            None => None,
        };
        let alerts = match outcome.alerts {
            Some(Ok(alerts)) => Some(alerts),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "alerts unavailable");
                record(&e);
                None
            }
            None => None,
        };

        // A snapshot with nothing the caller asked for must say why. A
        // missing current section also gets flagged even when forecast or
        // alerts came back, so replies can caveat the partial data.
        let all_missing = current.is_none() && forecast.is_none() && alerts.is_none();
        let unavailable = if (plan.current && current.is_none()) || all_missing {
            Some(first_error.unwrap_or_else(|| "weather data unavailable".to_string()))
        } else {
            None
        };

        WeatherSnapshot {
            current,
            forecast,
            alerts,
            unavailable,
        }
    }

    async fn attempt(&self, coords: Coordinates, plan: FetchPlan) -> AttemptOutcome {
        let current = async {
            if plan.current {
                Some(self.weather.current(coords).await)
            } else {
                None
            }
        };
        let forecast = async {
            if plan.forecast {
                Some(self.weather.forecast(coords).await)
            } else {
                None
            }
        };
        let alerts = async {
            if plan.alerts {
                Some(self.alerts.active_alerts(coords).await)
            } else {
                None
            }
        };

        let (current, forecast, alerts) = tokio::join!(current, forecast, alerts);
        AttemptOutcome {
            current,
            forecast,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Units;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_body() -> serde_json::Value {
        json!({
            "name": "Denver",
            "sys": {"country": "US"},
            "main": {"temp": 65.2, "feels_like": 64.0, "humidity": 30, "pressure": 1020},
            "wind": {"speed": 5.0, "deg": 90},
            "visibility": 16000,
            "weather": [{"description": "clear sky", "main": "Clear", "icon": "01d"}],
            "dt": 1_700_000_000,
            "coord": {"lat": 39.7392, "lon": -104.9903}
        })
    }

    fn forecast_body() -> serde_json::Value {
        json!({
            "list": [{
                "dt": 1_700_010_800,
                "main": {"temp": 60.0, "feels_like": 58.5, "humidity": 40, "pressure": 1018},
                "weather": [{"description": "few clouds", "main": "Clouds", "icon": "02d"}],
                "wind": {"speed": 4.0, "deg": 100},
                "pop": 0.1
            }],
            "city": {"name": "Denver", "country": "US"}
        })
    }

    fn points_body() -> serde_json::Value {
        json!({
            "properties": {
                "relativeLocation": {"properties": {"city": "Denver", "state": "CO"}}
            }
        })
    }

    fn aggregator(server: &MockServer, policy: AggregatePolicy) -> WeatherAggregator {
        let weather = WeatherClient::new_with_base_url(
            "test-key".to_string(),
            Units::Imperial,
            server.uri(),
        );
        let alerts = AlertsClient::new_with_base_url(server.uri());
        WeatherAggregator::new(weather, alerts, policy)
    }

    fn fast_policy(max_retries: u32) -> AggregatePolicy {
        AggregatePolicy {
            max_retries,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_fetches_only_planned_sections() {
        let mock_server = MockServer::start().await;

        // Only the alert endpoints may be hit for an alerts-only plan.
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(0)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(0)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/points/39.7392,-104.9903"))
            .respond_with(ResponseTemplate::new(200).set_body_json(points_body()))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/alerts/active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": []})))
            .mount(&mock_server)
            .await;

        let aggregator = aggregator(&mock_server, fast_policy(2));
        let plan = FetchPlan {
            alerts: true,
            ..Default::default()
        };
        let snapshot = aggregator
            .fetch(Coordinates::new(39.7392, -104.9903), plan)
            .await;

        assert!(snapshot.current.is_none());
        assert!(snapshot.forecast.is_none());
        assert!(snapshot.alerts.is_some());
        assert!(snapshot.unavailable.is_none());
    }

    #[tokio::test]
    async fn test_empty_plan_reports_gap_without_fetching() {
        let mock_server = MockServer::start().await;

        // A plan with no sections fans out to nothing at all.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let aggregator = aggregator(&mock_server, fast_policy(2));
        let snapshot = aggregator
            .fetch(Coordinates::new(39.7392, -104.9903), FetchPlan::default())
            .await;

        assert!(snapshot.current.is_none());
        assert!(snapshot.forecast.is_none());
        assert!(snapshot.alerts.is_none());
        assert_eq!(
            snapshot.unavailable.as_deref(),
            Some("no weather sections requested")
        );
    }

    #[tokio::test]
    async fn test_current_failure_retries_then_succeeds() {
        let mock_server = MockServer::start().await;

        // Two failures, then a success on the third attempt.
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&mock_server)
            .await;

        let aggregator = aggregator(&mock_server, fast_policy(2));
        let plan = FetchPlan {
            current: true,
            ..Default::default()
        };
        let snapshot = aggregator
            .fetch(Coordinates::new(39.7392, -104.9903), plan)
            .await;

        assert!(snapshot.current.is_some());
        assert!(snapshot.unavailable.is_none());
    }

    #[tokio::test]
    async fn test_current_failure_exhausts_retry_budget() {
        let mock_server = MockServer::start().await;

        // Initial attempt plus two retries, never more.
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&mock_server)
            .await;

        let aggregator = aggregator(&mock_server, fast_policy(2));
        let plan = FetchPlan {
            current: true,
            ..Default::default()
        };
        let snapshot = aggregator
            .fetch(Coordinates::new(39.7392, -104.9903), plan)
            .await;

        assert!(snapshot.current.is_none());
        assert!(snapshot.unavailable.is_some());
    }

    #[tokio::test]
    async fn test_forecast_failure_does_not_retry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let aggregator = aggregator(&mock_server, fast_policy(2));
        let plan = FetchPlan {
            current: true,
            forecast: true,
            ..Default::default()
        };
        let snapshot = aggregator
            .fetch(Coordinates::new(39.7392, -104.9903), plan)
            .await;

        // Partial result: conditions survive, forecast is simply absent.
        assert!(snapshot.current.is_some());
        assert!(snapshot.forecast.is_none());
        assert!(snapshot.unavailable.is_none());
    }

    #[tokio::test]
    async fn test_current_failure_keeps_forecast_but_flags_gap() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&mock_server)
            .await;

        let aggregator = aggregator(&mock_server, fast_policy(1));
        let plan = FetchPlan {
            current: true,
            forecast: true,
            ..Default::default()
        };
        let snapshot = aggregator
            .fetch(Coordinates::new(39.7392, -104.9903), plan)
            .await;

        assert!(snapshot.current.is_none());
        assert!(snapshot.forecast.is_some());
        assert!(snapshot.unavailable.is_some());
    }
}
