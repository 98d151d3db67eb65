//! Forward and reverse geocoding against a LocationIQ (Nominatim-compatible)
//! endpoint.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::http::{build_client, read_json, trim_base_url, HttpSettings};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::types::{string_or_number, Coordinates, Place, QueryError, ReverseGeolocation};

pub const DEFAULT_GEOCODING_URL: &str = "https://us1.locationiq.com/v1";
const SERVICE: &str = "geocoding";

#[derive(Debug, Deserialize)]
struct ApiPlace {
    #[serde(deserialize_with = "string_or_number")]
    place_id: String,
    lat: String,
    lon: String,
    display_name: String,
    address: Option<ApiAddress>,
}

#[derive(Debug, Deserialize)]
struct ApiAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl ApiPlace {
    fn coordinates(&self) -> Result<Coordinates, QueryError> {
        let parse = |value: &str, axis: &str| {
            value.trim().parse::<f64>().map_err(|e| {
                QueryError::Parse(format!("{SERVICE}: bad {axis} {value:?}: {e}"))
            })
        };
        Ok(Coordinates::new(
            parse(&self.lat, "latitude")?,
            parse(&self.lon, "longitude")?,
        ))
    }
}

impl TryFrom<ApiPlace> for Place {
    type Error = QueryError;

    fn try_from(api: ApiPlace) -> Result<Self, Self::Error> {
        let coordinates = api.coordinates()?;
        Ok(Place {
            place_id: api.place_id,
            coordinates,
            display_name: api.display_name,
        })
    }
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl GeocodingClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        settings: &HttpSettings,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: trim_base_url(base_url),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            retry: settings.retry,
        })
    }

    fn api_key(&self) -> Result<&str, QueryError> {
        self.api_key
            .as_deref()
            .ok_or(QueryError::MissingApiKey(SERVICE))
    }

    /// All places matching free text, best match first. No match is an empty
    /// list, not an error.
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, query: &str) -> Result<Vec<Place>, QueryError> {
        let key = self.api_key()?;
        let url = format!("{}/search", self.base_url);
        let params = [
            ("format", "json"),
            ("key", key),
            ("accept-language", "native"),
            ("q", query),
        ];

        let response = send_with_retry(&self.retry, || {
            self.client.get(&url).query(&params).send()
        })
        .await?;

        // LocationIQ answers 404 ("Unable to geocode") when nothing matches.
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("No places matched");
            return Ok(Vec::new());
        }

        let places: Vec<ApiPlace> = read_json(SERVICE, response).await?;
        places.into_iter().map(Place::try_from).collect()
    }

    /// Resolve free text to one place, preferring the one the user picked
    /// from the suggestions.
    pub async fn geolocate(
        &self,
        query: &str,
        place_id: Option<&str>,
    ) -> Result<Place, QueryError> {
        let places = self.search(query).await?;
        let place = select_place(places, place_id)
            .ok_or_else(|| QueryError::LocationNotFound(query.to_string()))?;
        tracing::info!("Geolocated {:?} to {}", query, place.coordinates);
        Ok(place)
    }

    /// Turn coordinates into a place name.
    #[instrument(skip(self), level = "info")]
    pub async fn reverse(&self, coordinates: Coordinates) -> Result<ReverseGeolocation, QueryError> {
        let key = self.api_key()?;
        let url = format!("{}/reverse", self.base_url);
        let lat = coordinates.latitude.to_string();
        let lon = coordinates.longitude.to_string();
        let params = [
            ("format", "json"),
            ("key", key),
            ("accept-language", "native"),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
        ];

        let response = send_with_retry(&self.retry, || {
            self.client.get(&url).query(&params).send()
        })
        .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(QueryError::LocationNotFound(coordinates.to_string()));
        }

        let mut api: ApiPlace = read_json(SERVICE, response).await?;
        let label = api.address.take().and_then(short_label);
        let result = ReverseGeolocation {
            coordinates: api.coordinates()?,
            display_name: api.display_name,
            label,
        };

        tracing::info!("Reverse geocoded to: {}", result.name());
        Ok(result)
    }
}

/// The place whose id matches the user's selection, else the top hit.
pub fn select_place(places: Vec<Place>, place_id: Option<&str>) -> Option<Place> {
    let selected = place_id.and_then(|id| places.iter().position(|p| p.place_id == id));
    let index = selected.unwrap_or(0);
    places.into_iter().nth(index)
}

/// "Place, Region" from an address, e.g. "Seattle, Washington".
fn short_label(addr: ApiAddress) -> Option<String> {
    let state = addr.state.clone();
    let country = addr.country.clone();

    let place = addr
        .city
        .or(addr.town)
        .or(addr.village)
        .or(addr.municipality)
        .or(addr.state_district)
        .or(addr.county)
        .or(addr.state)
        .or(addr.country)?;

    let region = [state, country]
        .into_iter()
        .flatten()
        .find(|r| !r.is_empty() && *r != place);

    Some(match region {
        Some(region) => format!("{place}, {region}"),
        None => place,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str) -> Place {
        Place {
            place_id: id.to_string(),
            coordinates: Coordinates::new(0.0, 0.0),
            display_name: format!("Place {id}"),
        }
    }

    fn address() -> ApiAddress {
        ApiAddress {
            city: None,
            town: None,
            village: None,
            municipality: None,
            state_district: None,
            state: None,
            county: None,
            country: None,
        }
    }

    #[test]
    fn test_select_place_by_id() {
        let picked = select_place(vec![place("1"), place("2")], Some("2")).unwrap();
        assert_eq!(picked.place_id, "2");
    }

    #[test]
    fn test_select_place_falls_back_to_first() {
        let picked = select_place(vec![place("1"), place("2")], Some("9")).unwrap();
        assert_eq!(picked.place_id, "1");
        let picked = select_place(vec![place("1"), place("2")], None).unwrap();
        assert_eq!(picked.place_id, "1");
    }

    #[test]
    fn test_select_place_empty() {
        assert!(select_place(Vec::new(), Some("1")).is_none());
    }

    #[test]
    fn test_label_city_and_state() {
        let addr = ApiAddress {
            city: Some("Seattle".into()),
            state: Some("Washington".into()),
            country: Some("United States".into()),
            ..address()
        };
        assert_eq!(short_label(addr).as_deref(), Some("Seattle, Washington"));
    }

    #[test]
    fn test_label_falls_back_to_country() {
        let addr = ApiAddress {
            village: Some("Hallstatt".into()),
            country: Some("Österreich".into()),
            ..address()
        };
        assert_eq!(short_label(addr).as_deref(), Some("Hallstatt, Österreich"));
    }

    #[test]
    fn test_label_skips_duplicate_region() {
        let addr = ApiAddress {
            state: Some("Berlin".into()),
            country: Some("Berlin".into()),
            ..address()
        };
        assert_eq!(short_label(addr).as_deref(), Some("Berlin"));
    }

    #[test]
    fn test_label_needs_some_name() {
        assert_eq!(short_label(address()), None);
    }

    #[test]
    fn test_place_id_may_be_numeric() {
        let api: ApiPlace = serde_json::from_str(
            r#"{"place_id": 12345, "lat": "48.85", "lon": "2.35", "display_name": "Paris"}"#,
        )
        .unwrap();
        let place = Place::try_from(api).unwrap();
        assert_eq!(place.place_id, "12345");
        assert_eq!(place.coordinates, Coordinates::new(48.85, 2.35));
    }

    #[test]
    fn test_bad_coordinates_are_parse_errors() {
        let api: ApiPlace = serde_json::from_str(
            r#"{"place_id": "1", "lat": "north", "lon": "2.35", "display_name": "Paris"}"#,
        )
        .unwrap();
        assert!(matches!(Place::try_from(api), Err(QueryError::Parse(_))));
    }

    #[test]
    fn test_missing_key_is_reported_before_sending() {
        let client = GeocodingClient::new("http://127.0.0.1:9", Some("  ".into()), &HttpSettings::default())
            .unwrap();
        assert!(matches!(client.api_key(), Err(QueryError::MissingApiKey(_))));
    }
}
