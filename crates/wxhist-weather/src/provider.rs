//! Historical daily aggregates from the Open-Meteo archive API.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use wxhist_form::DATE_FORMAT;

use crate::http::{build_client, read_json, trim_base_url, HttpSettings};
use crate::query::HistoricalParams;
use crate::retry::{send_with_retry, RetryPolicy};
use crate::types::{Coordinates, DailyRecord, DailyUnits, HistoricalWeather, QueryError};

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1";
const SERVICE: &str = "archive";
const DAILY_VARIABLES: &str = "temperature_2m_mean,sunshine_duration,precipitation_sum";

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
    timezone: Option<String>,
    daily_units: Option<DailyUnits>,
    daily: ArchiveDaily,
}

// Column-oriented: entry `i` of every array belongs to `time[i]`.
#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    time: Vec<NaiveDate>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    sunshine_duration: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

impl TryFrom<ArchiveResponse> for HistoricalWeather {
    type Error = QueryError;

    fn try_from(api: ArchiveResponse) -> Result<Self, Self::Error> {
        let ArchiveDaily {
            time,
            temperature_2m_mean,
            sunshine_duration,
            precipitation_sum,
        } = api.daily;

        let temperature = column("temperature_2m_mean", temperature_2m_mean, time.len())?;
        let sunshine = column("sunshine_duration", sunshine_duration, time.len())?;
        let precipitation = column("precipitation_sum", precipitation_sum, time.len())?;

        let days = time
            .into_iter()
            .zip(temperature)
            .zip(sunshine)
            .zip(precipitation)
            .map(|(((date, temperature_mean), sunshine_duration), precipitation_sum)| {
                DailyRecord {
                    date,
                    temperature_mean,
                    sunshine_duration,
                    precipitation_sum,
                }
            })
            .collect();

        Ok(HistoricalWeather {
            coordinates: Coordinates::new(api.latitude, api.longitude),
            elevation: api.elevation,
            timezone: api.timezone,
            units: api.daily_units.unwrap_or_default(),
            days,
        })
    }
}

/// An omitted column means "no data"; a column of the wrong length is a
/// broken response.
fn column(
    name: &str,
    values: Vec<Option<f64>>,
    len: usize,
) -> Result<Vec<Option<f64>>, QueryError> {
    if values.is_empty() {
        return Ok(vec![None; len]);
    }
    if values.len() != len {
        return Err(QueryError::Parse(format!(
            "{SERVICE}: {name} has {} values for {len} days",
            values.len()
        )));
    }
    Ok(values)
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl WeatherProvider {
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self, QueryError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: trim_base_url(base_url),
            retry: settings.retry,
        })
    }

    /// Daily mean temperature, sunshine and precipitation for every day in
    /// the range.
    #[instrument(skip(self), level = "info")]
    pub async fn historical(&self, params: &HistoricalParams) -> Result<HistoricalWeather, QueryError> {
        let url = format!("{}/archive", self.base_url);
        let start = params.start_date.format(DATE_FORMAT).to_string();
        let end = params.end_date.format(DATE_FORMAT).to_string();
        let latitude = params.coordinates.latitude.to_string();
        let longitude = params.coordinates.longitude.to_string();
        let query = [
            ("daily", DAILY_VARIABLES),
            ("start_date", start.as_str()),
            ("end_date", end.as_str()),
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
        ];

        let response = send_with_retry(&self.retry, || {
            self.client.get(&url).query(&query).send()
        })
        .await?;

        let api: ArchiveResponse = read_json(SERVICE, response).await?;
        let weather = HistoricalWeather::try_from(api)?;
        tracing::info!("Fetched {} days of history", weather.days.len());
        Ok(weather)
    }
}
