//! Query layer for wxhist
//!
//! Resolves places via LocationIQ and fetches daily history from the
//! Open-Meteo archive, with response caching and retries.

pub mod cache;
pub mod geocode;
pub mod http;
pub mod provider;
pub mod query;
pub mod retry;
pub mod service;
pub mod types;

pub use types::*;
pub use cache::QueryCache;
pub use geocode::{select_place, GeocodingClient, DEFAULT_GEOCODING_URL};
pub use http::HttpSettings;
pub use provider::{WeatherProvider, DEFAULT_ARCHIVE_URL};
pub use query::{GeolocationQuery, HistoricalParams, HistoricalWeatherQuery, ReverseGeolocationQuery};
pub use retry::RetryPolicy;
pub use service::WeatherQueries;
