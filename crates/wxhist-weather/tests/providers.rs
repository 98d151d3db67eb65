//! Provider clients against a mock HTTP server.

use std::time::Duration;

use chrono::NaiveDate;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxhist_weather::{
    Coordinates, GeocodingClient, GeolocationQuery, HistoricalParams, HistoricalWeatherQuery,
    HttpSettings, QueryError, RetryPolicy, ReverseGeolocationQuery, WeatherProvider,
    WeatherQueries,
};

fn settings(max_retries: u32) -> HttpSettings {
    HttpSettings {
        timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
    }
}

fn geocoder(server: &MockServer) -> GeocodingClient {
    GeocodingClient::new(&server.uri(), Some("test-key".into()), &settings(0)).unwrap()
}

fn provider(server: &MockServer, max_retries: u32) -> WeatherProvider {
    WeatherProvider::new(&server.uri(), &settings(max_retries)).unwrap()
}

fn search_results() -> serde_json::Value {
    serde_json::json!([
        {"place_id": "111", "lat": "40.7127281", "lon": "-74.0060152", "display_name": "New York, United States"},
        {"place_id": "222", "lat": "40.6526006", "lon": "-73.9497211", "display_name": "Brooklyn, New York, United States"}
    ])
}

fn archive_body() -> serde_json::Value {
    serde_json::json!({
        "latitude": 40.71,
        "longitude": -74.0,
        "elevation": 10.0,
        "timezone": "GMT",
        "daily_units": {"time": "iso8601", "temperature_2m_mean": "°C", "sunshine_duration": "s", "precipitation_sum": "mm"},
        "daily": {
            "time": ["2023-01-01", "2023-01-02"],
            "temperature_2m_mean": [5.5, 7.5],
            "sunshine_duration": [7200.0, 0.0],
            "precipitation_sum": [0.0, 12.3]
        }
    })
}

fn params() -> HistoricalParams {
    HistoricalParams {
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        coordinates: Coordinates::new(40.71, -74.0),
    }
}

#[tokio::test]
async fn test_search_sends_expected_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("format", "json"))
        .and(query_param("key", "test-key"))
        .and(query_param("accept-language", "native"))
        .and(query_param("q", "New York"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_results()))
        .expect(1)
        .mount(&server)
        .await;

    let places = geocoder(&server).search("New York").await.unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].place_id, "111");
    assert_eq!(places[0].coordinates, Coordinates::new(40.7127281, -74.0060152));
}

#[tokio::test]
async fn test_geolocate_prefers_selected_place() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_results()))
        .mount(&server)
        .await;

    let client = geocoder(&server);
    let picked = client.geolocate("New York", Some("222")).await.unwrap();
    assert_eq!(picked.display_name, "Brooklyn, New York, United States");

    let fallback = client.geolocate("New York", Some("999")).await.unwrap();
    assert_eq!(fallback.place_id, "111");
}

#[tokio::test]
async fn test_geolocate_unknown_place() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "Unable to geocode"})),
        )
        .mount(&server)
        .await;

    let result = geocoder(&server).geolocate("Atlantis", None).await;

    assert!(matches!(result, Err(QueryError::LocationNotFound(q)) if q == "Atlantis"));
}

#[tokio::test]
async fn test_geolocate_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let result = geocoder(&server).geolocate("Nowhere", None).await;

    assert!(matches!(result, Err(QueryError::LocationNotFound(_))));
}

#[tokio::test]
async fn test_invalid_key_is_a_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Invalid key"})),
        )
        .mount(&server)
        .await;

    let err = geocoder(&server).search("Paris").await.unwrap_err();

    match err {
        QueryError::Status {
            status, message, ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = GeocodingClient::new(&server.uri(), None, &settings(0)).unwrap();
    let result = client.search("Paris").await;

    assert!(matches!(result, Err(QueryError::MissingApiKey(_))));
}

#[tokio::test]
async fn test_reverse_geolocation_label() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "47.6062"))
        .and(query_param("lon", "-122.3321"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "place_id": 333,
            "lat": "47.6062",
            "lon": "-122.3321",
            "display_name": "Seattle, King County, Washington, United States",
            "address": {"city": "Seattle", "county": "King County", "state": "Washington", "country": "United States"}
        })))
        .mount(&server)
        .await;

    let result = geocoder(&server)
        .reverse(Coordinates::new(47.6062, -122.3321))
        .await
        .unwrap();

    assert_eq!(result.label.as_deref(), Some("Seattle, Washington"));
    assert_eq!(result.name(), "Seattle, Washington");
}

#[tokio::test]
async fn test_archive_request_and_parse() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .and(query_param(
            "daily",
            "temperature_2m_mean,sunshine_duration,precipitation_sum",
        ))
        .and(query_param("start_date", "2023-01-01"))
        .and(query_param("end_date", "2023-01-02"))
        .and(query_param("latitude", "40.71"))
        .and(query_param("longitude", "-74"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body()))
        .expect(1)
        .mount(&server)
        .await;

    let weather = provider(&server, 0).historical(&params()).await.unwrap();

    assert_eq!(weather.days.len(), 2);
    assert_eq!(weather.days[1].precipitation_sum, Some(12.3));
    let summary = weather.summary();
    assert_eq!(summary.mean_temperature, Some(6.5));
    assert_eq!(summary.total_sunshine_hours, Some(2.0));
}

#[tokio::test]
async fn test_archive_rejection_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": true,
            "reason": "Parameter 'start_date' is out of allowed range"
        })))
        .mount(&server)
        .await;

    let err = provider(&server, 3).historical(&params()).await.unwrap_err();

    assert!(!err.is_retryable());
    assert!(matches!(err, QueryError::Status { status: 400, ref message, .. } if message.contains("start_date")));
}

#[tokio::test]
async fn test_archive_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = provider(&server, 0).historical(&params()).await.unwrap_err();

    assert!(matches!(err, QueryError::Parse(_)));
}

#[tokio::test]
async fn test_archive_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body()))
        .expect(1)
        .mount(&server)
        .await;

    let weather = provider(&server, 3).historical(&params()).await.unwrap();

    assert_eq!(weather.days.len(), 2);
}

#[tokio::test]
async fn test_archive_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = provider(&server, 2).historical(&params()).await.unwrap_err();

    assert!(matches!(err, QueryError::Status { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_repeated_history_query_is_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(archive_body()))
        .expect(1)
        .mount(&server)
        .await;

    let queries = WeatherQueries::new(geocoder(&server), provider(&server, 0), Duration::from_secs(60));
    let query = HistoricalWeatherQuery {
        start_date: Some(params().start_date),
        end_date: Some(params().end_date),
        latitude: Some(40.71),
        longitude: Some(-74.0),
    };

    let first = queries.historical_weather(&query).await.unwrap().unwrap();
    let second = queries.historical_weather(&query).await.unwrap().unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_disabled_queries_send_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let queries = WeatherQueries::new(geocoder(&server), provider(&server, 0), Duration::from_secs(60));

    assert!(queries
        .geolocation(&GeolocationQuery::new(Some("  "), None))
        .await
        .unwrap()
        .is_none());
    assert!(queries
        .reverse_geolocation(&ReverseGeolocationQuery::new(Some(1.0), None))
        .await
        .unwrap()
        .is_none());
    assert!(queries
        .historical_weather(&HistoricalWeatherQuery::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_geolocation_cache_keys_on_selected_place() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_results()))
        .expect(2)
        .mount(&server)
        .await;

    let queries = WeatherQueries::new(geocoder(&server), provider(&server, 0), Duration::from_secs(60));

    let first = queries
        .geolocation(&GeolocationQuery::new(Some("New York"), None))
        .await
        .unwrap()
        .unwrap();
    let repeat = queries
        .geolocation(&GeolocationQuery::new(Some("New York"), None))
        .await
        .unwrap()
        .unwrap();
    let picked = queries
        .geolocation(&GeolocationQuery::new(Some("New York"), Some("222")))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, repeat);
    assert_eq!(picked.place_id, "222");
}
