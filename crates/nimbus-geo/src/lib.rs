//! Location handling: pulling place names out of chat messages and
//! resolving them to ranked coordinates.

pub mod client;
pub mod error;
pub mod extract;
pub mod resolve;
pub mod types;

pub use client::{GeoPlace, GeocodeClient};
pub use error::GeoError;
pub use extract::{extract_location, Extraction};
pub use resolve::LocationResolver;
pub use types::ResolvedLocation;
