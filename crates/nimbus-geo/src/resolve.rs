use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::instrument;

use crate::client::{GeoPlace, GeocodeClient};
use crate::error::GeoError;
use crate::types::ResolvedLocation;

const MAX_RESULTS: usize = 8;

static QUERY_WEATHER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(weather|forecast|alerts?|warnings?|conditions?|temperature|temp)\b")
        .expect("hardcoded pattern")
});

static QUERY_FILLER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(in|for|at|near|show|me|the|what's|how's|tell|give)\b")
        .expect("hardcoded pattern")
});

static TRAILING_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?.!]+$").expect("hardcoded pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("hardcoded pattern"));

/// One geocoding attempt within a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchQuery {
    query: String,
    limit: u32,
}

/// Turns a free-text candidate into ranked, deduplicated locations.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    client: GeocodeClient,
}

impl LocationResolver {
    pub fn new(client: GeocodeClient) -> Self {
        Self { client }
    }

    /// Resolves a candidate to at most eight ranked locations.
    ///
    /// Distinguishes two failures: `NotFound` when the search ran but
    /// nothing matched, and `Unavailable` when every upstream attempt
    /// failed. The returned list is never empty.
    ///
    /// # Errors
    ///
    /// `GeoError::NotFound` or `GeoError::Unavailable` as above.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve(&self, raw_query: &str) -> Result<Vec<ResolvedLocation>, GeoError> {
        let query = clean_query(raw_query);
        if query.is_empty() {
            return Err(GeoError::Unavailable {
                query: raw_query.to_string(),
                reason: "search query too short".to_string(),
            });
        }

        let mut merged: Vec<GeoPlace> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut any_ok = false;
        let mut last_error: Option<GeoError> = None;

        for attempt in search_queries(&query) {
            match self.client.search(&attempt.query, attempt.limit).await {
                Ok(places) => {
                    any_ok = true;
                    for place in places {
                        // Coordinates equal to four decimal places are the
                        // same place under two names; the first mention wins.
                        let key = format!("{:.4},{:.4}", place.lat, place.lon);
                        if seen.insert(key) {
                            merged.push(place);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(query = %attempt.query, error = %e, "geocoding attempt failed");
                    last_error = Some(e);
                }
            }
        }

        if !any_ok {
            let reason = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no search attempts ran".to_string());
            return Err(GeoError::Unavailable {
                query: raw_query.to_string(),
                reason,
            });
        }
        if merged.is_empty() {
            return Err(GeoError::NotFound {
                query: raw_query.to_string(),
            });
        }

        let mut ranked = rank(merged, &query);
        ranked.truncate(MAX_RESULTS);
        tracing::info!(count = ranked.len(), best = %ranked[0].display_name, "resolved location");
        Ok(ranked)
    }
}

/// Strips weather vocabulary, prepositions, and trailing punctuation so
/// only the place name reaches the geocoder.
fn clean_query(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let cleaned = QUERY_WEATHER_WORDS.replace_all(&lower, "");
    let cleaned = QUERY_FILLER_WORDS.replace_all(&cleaned, "");
    let cleaned = TRAILING_PUNCT.replace(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

/// The query as-is, plus US-suffixed variants when it names no country.
fn search_queries(query: &str) -> Vec<SearchQuery> {
    let mut queries = vec![SearchQuery {
        query: query.to_string(),
        limit: 10,
    }];
    if !query.contains(',') {
        for suffix in [", US", ", USA", ", United States"] {
            queries.push(SearchQuery {
                query: format!("{query}{suffix}"),
                limit: 5,
            });
        }
    }
    queries
}

/// Orders candidates: exact name matches, then prefix matches, then
/// United States results when the query names no region, then the name
/// alphabetically. Each criterion only breaks ties the earlier ones left,
/// so the domestic preference also decides between two exact matches.
/// Sorting is stable, so candidates that still tie keep their discovery
/// order.
fn rank(places: Vec<GeoPlace>, query: &str) -> Vec<ResolvedLocation> {
    let has_comma = query.contains(',');

    let mut ranked: Vec<ResolvedLocation> = places
        .into_iter()
        .map(|place| {
            let relevance = relevance(&place.name, query);
            ResolvedLocation {
                display_name: display_name(&place),
                name: place.name,
                state: place.state,
                country: place.country,
                lat: place.lat,
                lon: place.lon,
                relevance,
            }
        })
        .collect();

    ranked.sort_by(|a, b| sort_key(a, query, has_comma).cmp(&sort_key(b, query, has_comma)));
    ranked
}

fn sort_key(
    location: &ResolvedLocation,
    query: &str,
    has_comma: bool,
) -> (bool, bool, bool, String) {
    let name = location.name.to_lowercase();
    (
        name != query,
        !name.starts_with(query),
        has_comma || location.country != "US",
        name,
    )
}

/// Human label: name, state when it adds information, and country with a
/// USA special case.
fn display_name(place: &GeoPlace) -> String {
    let mut display = place.name.clone();
    if let Some(state) = &place.state {
        if !display.contains(state.as_str()) {
            display.push_str(&format!(", {state}"));
        }
    }
    if !place.country.is_empty() {
        if place.country == "US" {
            if !display.contains("USA") {
                display.push_str(", USA");
            }
        } else {
            display.push_str(&format!(", {}", place.country));
        }
    }
    display
}

/// Match quality against the cleaned query, 0 to 100.
fn relevance(name: &str, query: &str) -> u32 {
    let name = name.to_lowercase();
    if name == query {
        return 100;
    }
    if name.starts_with(query) {
        return 90;
    }
    if name.contains(query) {
        return 80;
    }
    query
        .split_whitespace()
        .filter(|word| name.contains(word))
        .count() as u32
        * 20
}
