//! End-to-end lookups against mocked providers.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxhist_core::config::API_KEY_ENV;
use wxhist_core::{App, AppError, Config, LookupRequest};
use wxhist_form::{FieldPath, FormInput, ValidationErrorKind};
use wxhist_weather::{Coordinates, QueryError};

fn config_for(server: &MockServer, api_key: Option<&str>) -> Config {
    let mut config = Config::default();
    config.geocoding.url = server.uri();
    config.geocoding.api_key = api_key.map(str::to_string);
    config.archive.url = server.uri();
    config.http.max_retries = 0;
    config
}

fn archive_body() -> serde_json::Value {
    serde_json::json!({
        "latitude": 40.71,
        "longitude": -74.01,
        "timezone": "GMT",
        "daily": {
            "time": ["2023-01-01", "2023-01-02"],
            "temperature_2m_mean": [3.0, 5.0],
            "sunshine_duration": [3600.0, null],
            "precipitation_sum": [0.0, 4.2]
        }
    })
}

async fn mount_archive(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/archive"))
        .and(query_param("start_date", "2023-01-01"))
        .and(query_param("end_date", "2023-01-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body()))
        .expect(expected)
        .mount(server)
        .await;
}

fn by_name(location: &str) -> LookupRequest {
    LookupRequest {
        input: FormInput::new("2023-01-01", "2023-01-02", Some(location), false),
        ..LookupRequest::default()
    }
}

#[tokio::test]
async fn test_lookup_by_place_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "New York"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"place_id": "1", "lat": "40.71", "lon": "-74.01", "display_name": "New York, United States"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_archive(&server, 1).await;

    let app = App::new(config_for(&server, Some("test-key"))).unwrap();
    let report = app.lookup(&by_name(" New York ")).await.unwrap();

    assert_eq!(report.location, "New York, United States");
    assert_eq!(report.coordinates, Coordinates::new(40.71, -74.01));
    assert_eq!(report.form.location(), Some("New York"));
    assert_eq!(report.weather.days.len(), 2);
    assert_eq!(report.weather.days[1].sunshine_duration, None);
}

#[tokio::test]
async fn test_invalid_input_fetches_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = App::new(config_for(&server, Some("test-key"))).unwrap();
    let request = LookupRequest {
        input: FormInput::new("2020-01-01", "2021-06-01", Some(""), false),
        ..LookupRequest::default()
    };

    let err = app.lookup(&request).await.unwrap_err();

    assert!(err.is_input_error());
    let errors: Vec<_> = err
        .field_errors()
        .unwrap()
        .iter()
        .map(|e| (e.path, e.kind))
        .collect();
    assert_eq!(
        errors,
        vec![
            (FieldPath::EndDate, ValidationErrorKind::SpanViolation),
            (FieldPath::Location, ValidationErrorKind::MissingField),
        ]
    );
}

#[tokio::test]
async fn test_lookup_by_coordinates_uses_reverse_label() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "place_id": "9",
            "lat": "40.71",
            "lon": "-74.01",
            "display_name": "Manhattan, New York County, New York, United States",
            "address": {"city": "New York", "state": "New York", "country": "United States"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_archive(&server, 1).await;

    let app = App::new(config_for(&server, Some("test-key"))).unwrap();
    let request = LookupRequest {
        input: FormInput::new("2023-01-01", "2023-01-02", None, true),
        coordinates: Some(Coordinates::new(40.71, -74.01)),
        ..LookupRequest::default()
    };

    let report = app.lookup(&request).await.unwrap();

    assert_eq!(report.location, "New York, United States");
    assert_eq!(report.weather.days.len(), 2);
}

#[tokio::test]
async fn test_coordinates_work_without_api_key() {
    if std::env::var(API_KEY_ENV).is_ok_and(|k| !k.trim().is_empty()) {
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_archive(&server, 1).await;

    let app = App::new(config_for(&server, None)).unwrap();
    let request = LookupRequest {
        input: FormInput::new("2023-01-01", "2023-01-02", None, true),
        coordinates: Some(Coordinates::new(40.71, -74.01)),
        ..LookupRequest::default()
    };

    let report = app.lookup(&request).await.unwrap();

    assert_eq!(report.location, "40.7100, -74.0100");
}

#[tokio::test]
async fn test_unknown_place_is_query_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "Unable to geocode"})))
        .mount(&server)
        .await;
    mount_archive(&server, 0).await;

    let app = App::new(config_for(&server, Some("test-key"))).unwrap();
    let err = app.lookup(&by_name("Atlantis")).await.unwrap_err();

    assert!(!err.is_input_error());
    assert!(matches!(err, AppError::Query(QueryError::LocationNotFound(_))));
}

#[tokio::test]
async fn test_api_mode_without_place_needs_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = App::new(config_for(&server, Some("test-key"))).unwrap();
    let request = LookupRequest {
        input: FormInput::new("2023-01-01", "2023-01-01", None, true),
        ..LookupRequest::default()
    };

    let err = app.lookup(&request).await.unwrap_err();

    assert!(matches!(err, AppError::Other(_)));
}

#[tokio::test]
async fn test_repeat_lookup_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"place_id": "1", "lat": "40.71", "lon": "-74.01", "display_name": "New York, United States"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_archive(&server, 1).await;

    let app = App::new(config_for(&server, Some("test-key"))).unwrap();
    let first = app.lookup(&by_name("New York")).await.unwrap();
    let second = app.lookup(&by_name("New York")).await.unwrap();

    assert_eq!(first, second);
}
