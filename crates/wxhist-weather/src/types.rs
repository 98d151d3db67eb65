use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A resolved point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True if both values are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A geocoding search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub place_id: String,
    pub coordinates: Coordinates,
    pub display_name: String,
}

/// Result of turning coordinates back into a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeolocation {
    pub coordinates: Coordinates,
    pub display_name: String,
    /// Short form such as "Seattle, Washington", when the address allows.
    pub label: Option<String>,
}

impl ReverseGeolocation {
    /// The best name to show a user.
    pub fn name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.display_name)
    }
}

/// Units reported by the archive for each daily column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyUnits {
    #[serde(rename = "temperature_2m_mean")]
    pub temperature: String,
    #[serde(rename = "sunshine_duration")]
    pub sunshine: String,
    #[serde(rename = "precipitation_sum")]
    pub precipitation: String,
}

impl Default for DailyUnits {
    fn default() -> Self {
        Self {
            temperature: "°C".to_string(),
            sunshine: "s".to_string(),
            precipitation: "mm".to_string(),
        }
    }
}

/// Aggregates for one day. Any column may be missing for a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub temperature_mean: Option<f64>,
    /// Seconds of sunshine.
    pub sunshine_duration: Option<f64>,
    pub precipitation_sum: Option<f64>,
}

impl DailyRecord {
    pub fn sunshine_hours(&self) -> Option<f64> {
        self.sunshine_duration.map(|s| s / 3600.0)
    }
}

/// Daily weather history for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalWeather {
    pub coordinates: Coordinates,
    pub elevation: Option<f64>,
    pub timezone: Option<String>,
    pub units: DailyUnits,
    pub days: Vec<DailyRecord>,
}

/// Range-wide totals and averages, skipping days with missing values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub days: usize,
    pub mean_temperature: Option<f64>,
    pub total_precipitation: Option<f64>,
    pub total_sunshine_hours: Option<f64>,
}

impl HistoricalWeather {
    pub fn summary(&self) -> WeatherSummary {
        let temperatures: Vec<f64> = self.days.iter().filter_map(|d| d.temperature_mean).collect();
        let mean_temperature = if temperatures.is_empty() {
            None
        } else {
            Some(temperatures.iter().sum::<f64>() / temperatures.len() as f64)
        };

        WeatherSummary {
            days: self.days.len(),
            mean_temperature,
            total_precipitation: sum_present(self.days.iter().map(|d| d.precipitation_sum)),
            total_sunshine_hours: sum_present(self.days.iter().map(DailyRecord::sunshine_hours)),
        }
    }
}

fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Query layer errors.
///
/// Kept apart from validation errors: these mean "try again later", never
/// "fix your input".
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),
}

impl QueryError {
    /// Whether repeating the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            Self::Parse(_) | Self::LocationNotFound(_) | Self::MissingApiKey(_) => false,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(e) if e.is_timeout() => "The request timed out. Please try again.",
            Self::Network(_) => "Unable to connect. Check your internet connection.",
            Self::Status { status: 429, .. } => {
                "Too many requests. Please wait a moment and try again."
            }
            Self::Status { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            Self::Status { .. } => "The weather service rejected the request. Please try again.",
            Self::Parse(_) => "Received an unexpected response. Please try again later.",
            Self::LocationNotFound(_) => "Location not found. Try a different search.",
            Self::MissingApiKey(_) => "Geocoding API key is not configured. Check settings.",
        }
    }
}

/// Accepts an identifier sent either as a JSON string or a number.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
