//! Weather data access: current conditions, forecasts, and active alerts,
//! plus the aggregator that settles a fetch plan into a single snapshot.

pub mod aggregate;
pub mod alerts;
pub mod client;
pub mod error;
pub mod types;

pub use aggregate::{AggregatePolicy, FetchPlan, WeatherAggregator};
pub use alerts::AlertsClient;
pub use client::WeatherClient;
pub use error::WeatherError;
pub use types::*;
