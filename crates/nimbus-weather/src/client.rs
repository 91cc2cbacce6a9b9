use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::error::WeatherError;
use crate::types::{
    compass_direction, heat_index, meters_to_miles, Coordinates, CurrentConditions, Forecast,
    ForecastPeriod, Units,
};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the OpenWeather current conditions and forecast endpoints.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    units: Units,
}

impl WeatherClient {
    pub fn new(api_key: String, units: Units) -> Self {
        Self::new_with_base_url(api_key, units, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(api_key: String, units: Units, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            units,
        }
    }

    /// Fetches current observed conditions for a coordinate pair.
    #[instrument(skip(self), level = "info")]
    pub async fn current(&self, coords: Coordinates) -> Result<CurrentConditions, WeatherError> {
        let coords = self.validated(coords)?;
        let url = format!("{}/data/2.5/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.query_value().to_string()),
            ])
            .send()
            .await
            .map_err(map_send_error)?;

        let data: CurrentResponse = self.handle_response(response).await?;
        Ok(self.to_conditions(data))
    }

    /// Fetches the next eight three-hour forecast periods.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast(&self, coords: Coordinates) -> Result<Forecast, WeatherError> {
        let coords = self.validated(coords)?;
        let url = format!("{}/data/2.5/forecast", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.query_value().to_string()),
            ])
            .send()
            .await
            .map_err(map_send_error)?;

        let data: ForecastResponse = self.handle_response(response).await?;
        Ok(to_forecast(data))
    }

    fn validated(&self, coords: Coordinates) -> Result<Coordinates, WeatherError> {
        if !coords.is_valid() {
            return Err(WeatherError::InvalidCoordinates {
                lat: coords.lat,
                lon: coords.lon,
            });
        }
        Ok(coords.rounded())
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
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WeatherError::InvalidApiKey),
            StatusCode::NOT_FOUND => Err(WeatherError::LocationNotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(WeatherError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(WeatherError::Api(format!("HTTP {status}: {body}")))
            }
        }
    }

    fn to_conditions(&self, data: CurrentResponse) -> CurrentConditions {
        let condition = data.weather.into_iter().next().unwrap_or_default();
        let wind = data.wind.unwrap_or_default();
        let wind_speed = (wind.speed.unwrap_or(0.0) * 10.0).round() / 10.0;
        let temperature = data.main.temp;
        let heat_index = (self.units == Units::Imperial && temperature >= 80.0)
            .then(|| heat_index(temperature, data.main.humidity));

        CurrentConditions {
            location: display_location(data.name, data.sys.country),
            temperature,
            temperature_rounded: temperature.round() as i32,
            feels_like: data.main.feels_like,
            feels_like_rounded: data.main.feels_like.round() as i32,
            heat_index,
            humidity: data.main.humidity,
            pressure: data.main.pressure,
            wind_speed,
            wind_direction: compass_direction(wind.deg.unwrap_or(0.0)).to_string(),
            visibility_miles: data.visibility.map(meters_to_miles),
            description: condition.description,
            condition: condition.main,
            icon: condition.icon,
            observed_at: chrono::DateTime::from_timestamp(data.dt, 0)
                .unwrap_or_else(chrono::Utc::now),
            coordinates: Coordinates::new(data.coord.lat, data.coord.lon),
        }
    }
}

fn map_send_error(e: reqwest::Error) -> WeatherError {
    if e.is_timeout() {
        WeatherError::Timeout
    } else {
        WeatherError::Network(e)
    }
}

fn display_location(name: String, country: Option<String>) -> String {
    match country {
        Some(country) if !country.is_empty() => format!("{name}, {country}"),
        _ => name,
    }
}

fn to_forecast(data: ForecastResponse) -> Forecast {
    let periods = data
        .list
        .into_iter()
        .take(8)
        .map(|entry| {
            let condition = entry.weather.into_iter().next().unwrap_or_default();
            let wind = entry.wind.unwrap_or_default();
            ForecastPeriod {
                time: chrono::DateTime::from_timestamp(entry.dt, 0)
                    .unwrap_or_else(chrono::Utc::now),
                temperature: entry.main.temp,
                temperature_rounded: entry.main.temp.round() as i32,
                feels_like: entry.main.feels_like,
                description: condition.description,
                condition: condition.main,
                icon: condition.icon,
                humidity: entry.main.humidity,
                wind_speed: (wind.speed.unwrap_or(0.0) * 10.0).round() / 10.0,
                precipitation_chance: (entry.pop.unwrap_or(0.0) * 100.0).round() as u32,
            }
        })
        .collect();

    Forecast {
        location: display_location(data.city.name, data.city.country),
        periods,
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: String,
    sys: SysSection,
    main: MainSection,
    #[serde(default)]
    wind: Option<WindSection>,
    #[serde(default)]
    visibility: Option<f64>,
    #[serde(default)]
    weather: Vec<ConditionSection>,
    dt: i64,
    coord: CoordSection,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
    city: CitySection,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: MainSection,
    #[serde(default)]
    weather: Vec<ConditionSection>,
    #[serde(default)]
    wind: Option<WindSection>,
    #[serde(default)]
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CitySection {
    name: String,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SysSection {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WindSection {
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConditionSection {
    #[serde(default)]
    description: String,
    #[serde(default)]
    main: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct CoordSection {
    lat: f64,
    lon: f64,
}
