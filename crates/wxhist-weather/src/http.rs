//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::retry::RetryPolicy;
use crate::types::QueryError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("wxhist/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

pub(crate) fn build_client(settings: &HttpSettings) -> Result<Client, QueryError> {
    Ok(Client::builder()
        .timeout(settings.timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

// Both providers report failures as a JSON object with one of these keys.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    reason: Option<String>,
}

/// Decode a successful body, or turn a failure status into `QueryError`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, QueryError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map_err(|e| QueryError::Parse(format!("{service}: {e}")));
    }

    Err(QueryError::Status {
        service,
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            reason: Some(reason),
            ..
        }) => reason,
        Ok(ErrorBody {
            error: Some(serde_json::Value::String(error)),
            ..
        }) => error,
        _ => body.chars().take(200).collect(),
    }
}
