//! Cached query execution.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::QueryCache;
use crate::geocode::GeocodingClient;
use crate::provider::WeatherProvider;
use crate::query::{
    CoordinateKey, GeolocationKey, GeolocationQuery, HistoricalKey, HistoricalWeatherQuery,
    ReverseGeolocationQuery,
};
use crate::types::{HistoricalWeather, Place, QueryError, ReverseGeolocation};

/// Runs queries against the providers, serving repeats from cache.
///
/// Every method returns `Ok(None)` for a disabled query.
#[derive(Debug)]
pub struct WeatherQueries {
    geocoding: GeocodingClient,
    provider: WeatherProvider,
    places: QueryCache<GeolocationKey, Place>,
    reverse: QueryCache<CoordinateKey, ReverseGeolocation>,
    history: QueryCache<HistoricalKey, Arc<HistoricalWeather>>,
}

impl WeatherQueries {
    pub fn new(geocoding: GeocodingClient, provider: WeatherProvider, stale_after: Duration) -> Self {
        Self {
            geocoding,
            provider,
            places: QueryCache::new(stale_after),
            reverse: QueryCache::new(stale_after),
            history: QueryCache::new(stale_after),
        }
    }

    pub async fn geolocation(&self, query: &GeolocationQuery) -> Result<Option<Place>, QueryError> {
        let Some(key) = query.key() else {
            return Ok(None);
        };
        if let Some(place) = self.places.get(&key) {
            tracing::debug!("Geolocation cache hit for {:?}", key.location);
            return Ok(Some(place));
        }

        let place = self
            .geocoding
            .geolocate(&key.location, key.place_id.as_deref())
            .await?;
        self.places.insert(key, place.clone());
        Ok(Some(place))
    }

    pub async fn reverse_geolocation(
        &self,
        query: &ReverseGeolocationQuery,
    ) -> Result<Option<ReverseGeolocation>, QueryError> {
        let Some(coordinates) = query.coordinates() else {
            return Ok(None);
        };
        let key = CoordinateKey::from(coordinates);
        if let Some(hit) = self.reverse.get(&key) {
            return Ok(Some(hit));
        }

        let result = self.geocoding.reverse(coordinates).await?;
        self.reverse.insert(key, result.clone());
        Ok(Some(result))
    }

    pub async fn historical_weather(
        &self,
        query: &HistoricalWeatherQuery,
    ) -> Result<Option<Arc<HistoricalWeather>>, QueryError> {
        let Some(params) = query.params() else {
            return Ok(None);
        };
        let key = params.key();
        if let Some(hit) = self.history.get(&key) {
            tracing::debug!("History cache hit");
            return Ok(Some(hit));
        }

        let weather = Arc::new(self.provider.historical(&params).await?);
        self.history.insert(key, Arc::clone(&weather));
        Ok(Some(weather))
    }

    /// Forget every cached response.
    pub fn clear_cache(&self) {
        self.places.clear();
        self.reverse.clear();
        self.history.clear();
    }
}
