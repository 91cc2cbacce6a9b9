use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration, persisted as TOML under the user's config
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub services: ServicesConfig,
    pub weather: WeatherConfig,
    pub generation: GenerationConfig,
}

/// Upstream endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub weather_base_url: String,
    pub alerts_base_url: String,
    pub generation_base_url: String,
    pub weather_api_key: Option<String>,
    pub generation_api_key: Option<String>,
}

/// Measurement system for upstream weather requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub units: Units,
    /// Extra aggregation attempts after a failed current-conditions fetch.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Models tried in order until one answers.
    pub models: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            weather_base_url: "https://api.openweathermap.org".to_string(),
            alerts_base_url: "https://api.weather.gov".to_string(),
            generation_base_url: "https://api.openai.com/v1".to_string(),
            weather_api_key: std::env::var("OPENWEATHER_API_KEY")
                .ok()
                .or_else(|| std::env::var("WEATHER_API_KEY").ok()),
            generation_api_key: std::env::var("OPENAI_API_KEY").ok(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            units: Units::Imperial,
            max_retries: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "gpt-3.5-turbo-0125".to_string(),
                "gpt-3.5-turbo".to_string(),
                "gpt-4o-mini".to_string(),
            ],
            max_tokens: 1000,
            temperature: 0.8,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            services: ServicesConfig::default(),
            weather: WeatherConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Outcome of a configuration check: hard errors and advisory warnings.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn error_summary(&self) -> String {
        self.errors.join("; ")
    }
}

impl Config {
    /// Loads the config file, writing defaults first if none exists.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, parsed, or created.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("failed to parse config at {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            Ok(config)
        }
    }

    /// Loads and validates, refusing to start on hard errors and logging
    /// any warnings.
    ///
    /// # Errors
    ///
    /// Fails on unreadable config or failed validation.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();
        if !validation.is_valid() {
            anyhow::bail!(
                "configuration validation failed: {}",
                validation.error_summary()
            );
        }
        for warning in &validation.warnings {
            tracing::warn!("configuration warning: {warning}");
        }
        Ok((config, validation))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(
            &self.services.weather_base_url,
            "services.weather_base_url",
            &mut result,
        );
        validate_url(
            &self.services.alerts_base_url,
            "services.alerts_base_url",
            &mut result,
        );
        validate_url(
            &self.services.generation_base_url,
            "services.generation_base_url",
            &mut result,
        );

        if self.services.weather_api_key.is_none() {
            result.add_warning(
                "no weather API key configured (OPENWEATHER_API_KEY); weather lookups will fail",
            );
        }
        if self.services.generation_api_key.is_none() {
            result.add_warning(
                "no generation API key configured (OPENAI_API_KEY); replies will fail",
            );
        }

        if self.generation.models.is_empty() {
            result.add_error("generation.models must list at least one model");
        }
        if self.generation.max_tokens == 0 {
            result.add_error("generation.max_tokens must be positive");
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            result.add_warning(format!(
                "generation.temperature {} is outside the usual 0.0..=2.0 range",
                self.generation.temperature
            ));
        }

        if self.weather.max_retries > 5 {
            result.add_warning(format!(
                "weather.max_retries {} will make failing requests very slow",
                self.weather.max_retries
            ));
        }

        result
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("nimbus").join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match url::Url::parse(url_str) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https") {
                result.add_error(format!("{field_name} must use http or https"));
            }
            if url.host().is_none() {
                result.add_error(format!("{field_name} must have a host"));
            }
            if url.port() == Some(0) {
                result.add_error(format!("{field_name} must not use port 0"));
            }
        }
        Err(e) => result.add_error(format!("{field_name} is not a valid URL: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        let validation = config.validate();
        assert!(validation.is_valid(), "{}", validation.error_summary());
    }

    #[test]
    fn test_default_endpoints() {
        let config = Config::default();
        assert_eq!(
            config.services.weather_base_url,
            "https://api.openweathermap.org"
        );
        assert_eq!(config.services.alerts_base_url, "https://api.weather.gov");
        assert_eq!(config.generation.models.len(), 3);
        assert_eq!(config.weather.max_retries, 2);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.services.weather_base_url = "ftp://example.com".to_string();
        let validation = config.validate();
        assert!(!validation.is_valid());
        assert!(validation.error_summary().contains("weather_base_url"));
    }

    #[test]
    fn test_validate_rejects_empty_model_list() {
        let mut config = Config::default();
        config.generation.models.clear();
        let validation = config.validate();
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_validate_warns_on_wild_temperature() {
        let mut config = Config::default();
        config.generation.temperature = 3.5;
        let validation = config.validate();
        assert!(validation.is_valid());
        assert!(!validation.warnings.is_empty());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.weather.units = Units::Metric;
        config.generation.models = vec!["gpt-4o-mini".to_string()];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.units, Units::Metric);
        assert_eq!(loaded.generation.models, vec!["gpt-4o-mini".to_string()]);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(!path.exists());
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.weather.max_retries, 2);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather]\nunits = \"metric\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.weather.units, Units::Metric);
        assert_eq!(config.generation.max_tokens, 1000);
    }
}
