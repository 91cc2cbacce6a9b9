//! Vocabulary-based intent classification for chat messages.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use nimbus_geo::Extraction;

static WEATHER_VOCAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(weather|temperatures?|temps?|rain(?:ing|y)?|snow(?:ing|y)?|wind(?:y)?|humidity|forecasts?|alerts?|warnings?|storms?|cloudy|sunny|conditions?|hot|cold|warm|cool)\b",
    )
    .expect("hardcoded pattern")
});

static ALERT_VOCAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(watch(?:es)?|warnings?|alerts?|advisor(?:y|ies)|severe|storms?|tornado(?:e?s)?|hurricanes?|flood(?:ing|s)?|emergenc(?:y|ies))\b",
    )
    .expect("hardcoded pattern")
});

static FORECAST_VOCAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(forecasts?|tomorrow|week(?:end)?|days|upcoming|future|tonight|morning)\b")
        .expect("hardcoded pattern")
});

static PRESENT_VOCAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(now|current(?:ly)?|today|right now|this moment)\b")
        .expect("hardcoded pattern")
});

// Topic keywords are checked in order; the first topic with any keyword
// present in the message wins.
const TOPICS: &[(&str, &[&str])] = &[
    (
        "tornado",
        &[
            "tornado",
            "funnel cloud",
            "supercell",
            "wall cloud",
            "mesocyclone",
        ],
    ),
    (
        "hurricane",
        &["hurricane", "tropical storm", "eye wall", "spiral bands"],
    ),
    (
        "radar_reading",
        &["radar", "reflectivity", "velocity", "storm relative"],
    ),
    (
        "thunderstorm",
        &["thunderstorm", "supercell", "multicell", "squall line"],
    ),
    (
        "winter_weather",
        &["snow", "ice storm", "blizzard", "freezing rain"],
    ),
];

static EXPLANATORY: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"how do(?:es)? .+ work",
        r"what (?:is|are) .+",
        r"explain .+",
        r"show me .+",
        r"how to (?:read|identify|spot) .+",
        r"difference between .+",
        r"types of .+",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("hardcoded pattern"))
    .collect()
});

/// What a message asks for, derived from its vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// True when any weather, alert, or forecast vocabulary is present.
    pub wants_weather_data: bool,
    pub needs_current: bool,
    pub needs_forecast: bool,
    pub needs_alerts: bool,
    /// True when the message asks how weather works rather than what it is.
    pub is_educational: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educational_topic: Option<&'static str>,
}

/// Classifies a message.
///
/// Current conditions are the default request: they are wanted whenever
/// present-time vocabulary appears, and also when nothing narrows the
/// message to alerts or forecast.
///
/// A message reads as educational only when explanatory phrasing (or a
/// known topic keyword) appears AND nothing anchors it to a concrete
/// report: a confidently extracted location, present-time vocabulary, or
/// forecast vocabulary each pull it back to a data request. A bare
/// whole-message candidate does not.
pub fn classify(message: &str, extraction: Option<&Extraction>) -> Intent {
    let lower = message.to_lowercase();

    let needs_alerts = ALERT_VOCAB.is_match(&lower);
    let needs_forecast = FORECAST_VOCAB.is_match(&lower);
    let explicit_present = PRESENT_VOCAB.is_match(&lower);
    let wants_weather_data = WEATHER_VOCAB.is_match(&lower) || needs_alerts;

    let topic = topic_for(&lower);
    let explanatory = topic.is_some() || EXPLANATORY.iter().any(|p| p.is_match(&lower));
    let confident_location = extraction.is_some_and(|e| !e.bare);
    let is_educational = explanatory && !confident_location && !explicit_present && !needs_forecast;

    Intent {
        wants_weather_data,
        needs_current: explicit_present || (!needs_alerts && !needs_forecast),
        needs_forecast,
        needs_alerts,
        is_educational,
        educational_topic: if is_educational {
            Some(topic.unwrap_or("general"))
        } else {
            None
        },
    }
}

fn topic_for(lower: &str) -> Option<&'static str> {
    TOPICS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(name, _)| *name)
}
