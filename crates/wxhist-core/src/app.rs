use std::sync::Arc;

use wxhist_form::{FieldErrors, FormInput, FormSchema, ValidatedForm};
use wxhist_weather::{
    Coordinates, GeocodingClient, GeolocationQuery, HistoricalWeather, HistoricalWeatherQuery,
    QueryError, ReverseGeolocationQuery, WeatherProvider, WeatherQueries,
};

use crate::config::Config;
use crate::error::{AppError, ConfigError};

/// One lookup as the user asked for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupRequest {
    pub input: FormInput,
    /// Suggestion the user picked from a previous search
    pub place_id: Option<String>,
    /// Skip the place search and use these coordinates
    pub coordinates: Option<Coordinates>,
}

/// Resolved place plus its daily history.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: String,
    pub coordinates: Coordinates,
    pub form: ValidatedForm,
    pub weather: Arc<HistoricalWeather>,
}

/// Validates input, resolves the place, then fetches its history.
#[derive(Debug)]
pub struct App {
    config: Arc<Config>,
    schema: FormSchema,
    queries: WeatherQueries,
}

impl App {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }
        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        let settings = config.http_settings();
        let geocoding = GeocodingClient::new(
            &config.geocoding.url,
            config.geocoding.effective_api_key(),
            &settings,
        )?;
        let provider = WeatherProvider::new(&config.archive.url, &settings)?;

        Ok(Self {
            schema: FormSchema::new(config.form_rules()),
            queries: WeatherQueries::new(geocoding, provider, config.stale_after()),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queries(&self) -> &WeatherQueries {
        &self.queries
    }

    pub fn validate(&self, input: &FormInput) -> Result<ValidatedForm, FieldErrors> {
        self.schema.validate(input)
    }

    /// Nothing is fetched unless the input validates.
    pub async fn lookup(&self, request: &LookupRequest) -> Result<WeatherReport, AppError> {
        let form = self.validate(&request.input)?;
        tracing::info!(
            "Looking up {} to {}",
            form.start_date_text(),
            form.end_date_text()
        );

        let (location, coordinates) = match request.coordinates {
            Some(coordinates) => self.name_coordinates(coordinates).await?,
            None => self.resolve_place(&form, request.place_id.as_deref()).await?,
        };

        let query = HistoricalWeatherQuery::from_form(&form, Some(coordinates));
        let weather = self
            .queries
            .historical_weather(&query)
            .await?
            .ok_or_else(|| anyhow::anyhow!("History query disabled for {}", coordinates))?;

        Ok(WeatherReport {
            location,
            coordinates,
            form,
            weather,
        })
    }

    async fn resolve_place(
        &self,
        form: &ValidatedForm,
        place_id: Option<&str>,
    ) -> Result<(String, Coordinates), AppError> {
        let query = GeolocationQuery::from_form(form, place_id);
        match self.queries.geolocation(&query).await? {
            Some(place) => Ok((place.display_name, place.coordinates)),
            None => Err(anyhow::anyhow!("No location given: enter a place name or coordinates").into()),
        }
    }

    /// Coordinates are usable without a name, so a missing API key only
    /// costs the label.
    async fn name_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<(String, Coordinates), AppError> {
        let query = ReverseGeolocationQuery::new(Some(coordinates.latitude), Some(coordinates.longitude));
        if !query.is_enabled() {
            return Err(anyhow::anyhow!("Coordinates out of range: {}", coordinates).into());
        }

        match self.queries.reverse_geolocation(&query).await {
            Ok(Some(found)) => Ok((found.name().to_string(), coordinates)),
            Ok(None) => Ok((coordinates.to_string(), coordinates)),
            Err(QueryError::MissingApiKey(_)) => {
                tracing::debug!("No geocoding key, labelling by coordinates");
                Ok((coordinates.to_string(), coordinates))
            }
            Err(e) => Err(e.into()),
        }
    }
}
