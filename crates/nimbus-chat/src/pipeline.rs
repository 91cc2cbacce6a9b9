//! End-to-end orchestration of one chat turn.
//!
//! A turn flows through fixed stages: extract a location candidate,
//! classify intent, resolve the candidate, fetch the weather sections
//! the intent asks for, assemble the context, generate a reply through
//! the model chain, and polish the result. Failures fold into the
//! outcome instead of propagating: an unresolvable location becomes a
//! clarification reply and an exhausted model chain becomes a canned
//! fallback.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::instrument;

use nimbus_core::Config;
use nimbus_geo::{extract_location, GeoError, GeocodeClient, LocationResolver, ResolvedLocation};
use nimbus_llm::{
    build_messages, system_prompt, ChatCompletionsClient, FallbackChain, PromptInputs,
    FALLBACK_REPLY,
};
use nimbus_weather::{
    AggregatePolicy, AlertsClient, Coordinates, FetchPlan, Units, WeatherAggregator, WeatherClient,
    WeatherSnapshot,
};

use crate::context::assemble;
use crate::intent::{classify, Intent};
use crate::sanitize::Sanitizer;
use crate::types::{ChatOutcome, ChatReply, ChatRequest};

/// Orchestrates chat turns.
#[derive(Debug)]
pub struct Pipeline {
    resolver: LocationResolver,
    aggregator: WeatherAggregator,
    chain: FallbackChain,
    sanitizer: Sanitizer,
}

impl Pipeline {
    pub fn new(
        resolver: LocationResolver,
        aggregator: WeatherAggregator,
        chain: FallbackChain,
        sanitizer: Sanitizer,
    ) -> Self {
        Self {
            resolver,
            aggregator,
            chain,
            sanitizer,
        }
    }

    /// Wires every stage from configuration.
    pub fn from_config(config: &Config) -> Self {
        let units = match config.weather.units {
            nimbus_core::Units::Imperial => Units::Imperial,
            nimbus_core::Units::Metric => Units::Metric,
        };
        let weather_key = config.services.weather_api_key.clone().unwrap_or_default();
        let generation_key = config
            .services
            .generation_api_key
            .clone()
            .unwrap_or_default();

        let resolver = LocationResolver::new(GeocodeClient::new_with_base_url(
            weather_key.clone(),
            config.services.weather_base_url.clone(),
        ));
        let aggregator = WeatherAggregator::new(
            WeatherClient::new_with_base_url(
                weather_key,
                units,
                config.services.weather_base_url.clone(),
            ),
            AlertsClient::new_with_base_url(config.services.alerts_base_url.clone()),
            AggregatePolicy {
                max_retries: config.weather.max_retries,
                retry_delay: Duration::from_millis(config.weather.retry_delay_ms),
            },
        );
        let chain = FallbackChain::new(
            Arc::new(ChatCompletionsClient::new_with_base_url(
                generation_key,
                config.services.generation_base_url.clone(),
            )),
            config.generation.models.clone(),
        )
        .with_sampling(config.generation.max_tokens, config.generation.temperature);

        Self::new(resolver, aggregator, chain, Sanitizer::default())
    }

    /// Runs one chat turn.
    ///
    /// Never returns a transport-level error: every failure folds into
    /// one of the `ChatOutcome` variants.
    #[instrument(skip(self, request), level = "info")]
    pub async fn handle(&self, request: &ChatRequest) -> ChatOutcome {
        let message = request.message.trim();
        if message.is_empty() {
            return ChatOutcome::BadRequest {
                error: "Message is required".to_string(),
            };
        }

        let extraction = extract_location(message);
        let intent = classify(message, extraction.as_ref());
        tracing::info!(
            wants_weather = intent.wants_weather_data,
            educational = intent.is_educational,
            candidate = extraction.as_ref().map(|e| e.text.as_str()),
            "classified message"
        );

        // Resolve the candidate. Educational turns skip resolution
        // entirely so topic words never get geocoded.
        let mut resolved: Option<ResolvedLocation> = None;
        let mut searched: Option<String> = None;
        if !intent.is_educational {
            if let Some(candidate) = &extraction {
                searched = Some(candidate.text.clone());
                match self.resolver.resolve(&candidate.text).await {
                    Ok(locations) => resolved = locations.into_iter().next(),
                    Err(error) => {
                        return self.clarification_reply(
                            request,
                            intent,
                            candidate.text.clone(),
                            &error,
                        );
                    }
                }
            }
        }

        let target = resolved
            .as_ref()
            .map(|r| Coordinates::new(r.lat, r.lon))
            .or(request.location);

        let mut weather: Option<WeatherSnapshot> = None;
        let mut error: Option<String> = None;
        let mut alerts_attempted = false;

        if !intent.is_educational && intent.wants_weather_data {
            match target {
                Some(coords) => {
                    let plan = FetchPlan {
                        current: intent.needs_current,
                        forecast: intent.needs_forecast,
                        alerts: intent.needs_alerts,
                    };
                    alerts_attempted = plan.alerts;
                    weather = Some(self.aggregator.fetch(coords, plan).await);
                }
                None => {
                    tracing::info!("weather wanted but no usable location");
                    error = Some("Location not available for weather data".to_string());
                }
            }
        }

        let context = assemble(
            request,
            intent,
            resolved.as_ref(),
            searched,
            weather,
            error,
            Utc::now(),
        );

        let inputs = PromptInputs {
            user_message: message,
            searched_location: context.searched_location.as_deref(),
            location_used: context.location_used.as_deref(),
            location_switched: context.has_location_switch,
            alert_count: context
                .weather
                .as_ref()
                .and_then(|w| w.alerts.as_ref())
                .map(|a| a.alert_count),
            alerts_requested: alerts_attempted,
            educational_topic: context.intent.educational_topic,
            context: serde_json::to_value(&context).unwrap_or(serde_json::Value::Null),
        };
        let system = system_prompt(&inputs);
        let messages = build_messages(&system, &request.conversation_history, message);

        match self.chain.generate(&messages).await {
            Ok(generation) => {
                let response = self.sanitizer.polish(&generation.text, &context);
                ChatOutcome::Reply(ChatReply {
                    response,
                    location_found: resolved,
                    searched_for: context.searched_location.clone(),
                    usage: generation.usage,
                    model_used: Some(generation.model),
                    weather_data: context,
                })
            }
            Err(error) => {
                tracing::error!(error = %error, "every model failed");
                ChatOutcome::BackendUnavailable {
                    error: "AI service unavailable".to_string(),
                    fallback: FALLBACK_REPLY.to_string(),
                }
            }
        }
    }

    /// Short-circuit reply when the named place could not be resolved.
    /// The generation chain and sanitizer are both bypassed; the user
    /// gets the resolver's clarification text as-is.
    fn clarification_reply(
        &self,
        request: &ChatRequest,
        intent: Intent,
        searched: String,
        error: &GeoError,
    ) -> ChatOutcome {
        tracing::warn!(query = %searched, error = %error, "location resolution failed");

        let mut context = assemble(
            request,
            intent,
            None,
            Some(searched.clone()),
            None,
            Some(error.marker()),
            Utc::now(),
        );
        if matches!(error, GeoError::NotFound { .. }) {
            context.needs_location = true;
        }

        ChatOutcome::Reply(ChatReply {
            response: error.user_message(),
            weather_data: context,
            location_found: None,
            searched_for: Some(searched),
            usage: None,
            model_used: None,
        })
    }
}
