use serde::{Deserialize, Serialize};

/// A geocoded place, ranked and labeled for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Human label, e.g. "Springfield, Illinois, USA".
    pub display_name: String,
    /// Match quality against the cleaned query, 0 to 100.
    pub relevance: u32,
}
