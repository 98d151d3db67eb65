//! Query descriptors.
//!
//! Each query holds the (possibly incomplete) inputs it depends on. A query
//! with any required input absent is disabled: it yields no key and is never
//! sent. The key doubles as the cache key, so identical inputs share one
//! response.

use chrono::NaiveDate;
use wxhist_form::ValidatedForm;

use crate::types::Coordinates;

/// Coordinates rounded to micro-degrees so they can be hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    lat_micro: i64,
    lon_micro: i64,
}

impl From<Coordinates> for CoordinateKey {
    fn from(c: Coordinates) -> Self {
        Self {
            lat_micro: (c.latitude * 1e6).round() as i64,
            lon_micro: (c.longitude * 1e6).round() as i64,
        }
    }
}

fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    let coordinates = Coordinates::new(latitude?, longitude?);
    if !coordinates.is_valid() {
        tracing::debug!("Ignoring out-of-range coordinates {}", coordinates);
        return None;
    }
    Some(coordinates)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeolocationKey {
    pub location: String,
    pub place_id: Option<String>,
}

/// Free-text place search, optionally pinned to a picked suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeolocationQuery {
    pub location: Option<String>,
    pub place_id: Option<String>,
}

impl GeolocationQuery {
    pub fn new(location: Option<&str>, place_id: Option<&str>) -> Self {
        Self {
            location: location.map(str::to_string),
            place_id: place_id.map(str::to_string),
        }
    }

    pub fn from_form(form: &ValidatedForm, place_id: Option<&str>) -> Self {
        Self::new(form.location(), place_id)
    }

    /// `None` while there is no search text.
    pub fn key(&self) -> Option<GeolocationKey> {
        let location = self.location.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
        Some(GeolocationKey {
            location: location.to_string(),
            place_id: self.place_id.clone().filter(|id| !id.is_empty()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.key().is_some()
    }
}

/// Coordinates to place name.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReverseGeolocationQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ReverseGeolocationQuery {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `None` until both values are present and in range.
    pub fn coordinates(&self) -> Option<Coordinates> {
        coordinates(self.latitude, self.longitude)
    }

    pub fn is_enabled(&self) -> bool {
        self.coordinates().is_some()
    }
}

/// Fully resolved inputs for an archive request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub coordinates: Coordinates,
}

impl HistoricalParams {
    pub fn key(&self) -> HistoricalKey {
        HistoricalKey {
            start_date: self.start_date,
            end_date: self.end_date,
            coordinates: self.coordinates.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoricalKey {
    start_date: NaiveDate,
    end_date: NaiveDate,
    coordinates: CoordinateKey,
}

/// Daily history for a date range at a point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoricalWeatherQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl HistoricalWeatherQuery {
    /// Dates from a validated form; coordinates once they are resolved.
    pub fn from_form(form: &ValidatedForm, coordinates: Option<Coordinates>) -> Self {
        Self {
            start_date: Some(form.start_date()),
            end_date: Some(form.end_date()),
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
        }
    }

    /// `None` until every input is present.
    pub fn params(&self) -> Option<HistoricalParams> {
        Some(HistoricalParams {
            start_date: self.start_date?,
            end_date: self.end_date?,
            coordinates: coordinates(self.latitude, self.longitude)?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.params().is_some()
    }
}
