use chrono::NaiveDate;
use covid19_api::{Covid19Client, Error, Region, SeriesKind};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The blocking reqwest client must live outside the async runtime, so every
// client is built, used and dropped inside `spawn_blocking`.
fn client_for(
    server: &MockServer,
    token: &str,
) -> impl FnOnce() -> Covid19Client + Send + 'static {
    let uri = server.uri();
    let token = token.to_string();
    move || {
        let mut client = Covid19Client::new(token);
        client.set_base_url(uri);
        client.set_retry_sleep(Duration::ZERO);
        client.set_timeout(Duration::from_secs(5));
        client
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn daily_reports_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sep2020"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Code": 200,
            "Message": "OK",
            "Document": [
                {"id": 1, "country_region": "China", "confirmed": 68139},
                {"id": 2, "country_region": "Italy", "confirmed": 269214}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let build = client_for(&server, "secret-token");
    let batch = tokio::task::spawn_blocking(move || {
        build().get_reports_at(&NaiveDate::from_ymd_opt(2020, 9, 1).unwrap())
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(batch.reports.len(), 2);
    assert_eq!(batch.reports[1].confirmed, 269214);
}

#[tokio::test(flavor = "multi_thread")]
async fn rate_limited_request_is_retried_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/time_series_deaths_global"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/time_series_deaths_global"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Code": 200,
            "Message": "OK",
            "Document": [{"id": 9, "country_region": "France", "2/1/20": 0.0, "2/2/20": 1.0}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let build = client_for(&server, "t");
    let batch = tokio::task::spawn_blocking(move || {
        build().get_time_series(SeriesKind::Deaths, Region::Global)
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(batch.records[0].id, 9);
    assert_eq!(batch.records[0].counts["2/2/20"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_over_http_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/time_series_confirmed_us"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let build = client_for(&server, "t");
    let err = tokio::task::spawn_blocking(move || build().get_time_series_confirmed_us())
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, Error::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn token_exchange_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"username": "testapi1", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc.def.ghi"))
        .expect(1)
        .mount(&server)
        .await;

    let build = client_for(&server, "");
    let token = tokio::task::spawn_blocking(move || {
        let client = build().authenticate("testapi1", "pw")?;
        Ok::<_, Error>(client.token().to_string())
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(token, "abc.def.ghi");
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let mut client = Covid19Client::new("t");
    client.set_base_url("http://127.0.0.1:1");
    client.set_timeout(Duration::from_secs(2));

    let err = client.get_time_series_deaths_us().unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
}
