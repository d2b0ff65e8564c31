mod helpers;
use clockin_client::api_client::AttendanceApi;
use clockin_client::error::ApiError;
use clockin_common::domain::{AttendanceStatus, EmployeeId};
use helpers::build_settings;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn me() -> EmployeeId {
    EmployeeId::new("EMP-0042")
}

#[tokio::test]
async fn status_is_fetched_for_employee_and_company() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checkin/status"))
        .and(query_param("employeeId", "EMP-0042"))
        .and(query_param("company", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "status": "checked-in",
                "checkInTime": "2026-10-14T09:00:00.000Z",
                "totalMinutes": 125
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (settings, _dir) = build_settings(&server.uri()).unwrap();
    let client = settings.api_client(Some("acme")).unwrap();
    let data = client.status(&me()).await.unwrap();

    assert_eq!(data.status(), AttendanceStatus::CheckedIn);
    assert_eq!(data.check_in_time.as_deref(), Some("2026-10-14T09:00:00.000Z"));
    assert_eq!(data.total_minutes, Some(125.0));
}

#[tokio::test]
async fn session_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checkin/status"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "status": "checked-out", "totalMinutes": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (settings, _dir) = build_settings(&server.uri()).unwrap();
    fs_err::write(&settings.session_path, "secret-token\n").unwrap();
    let client = settings.api_client(None).unwrap();

    let data = client.status(&me()).await.unwrap();
    assert_eq!(data.status(), AttendanceStatus::CheckedOut);
}

#[tokio::test]
async fn check_in_and_out_post_the_employee() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkin"))
        .and(body_json(json!({ "employeeId": "EMP-0042" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "checkInTime": "2026-10-14T09:00:00Z" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/checkout"))
        .and(body_json(json!({ "employeeId": "EMP-0042" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "status": "checked-out",
                "checkInTime": "2026-10-14T09:00:00Z",
                "totalMinutes": 480
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (settings, _dir) = build_settings(&server.uri()).unwrap();
    let client = settings.api_client(None).unwrap();

    let checked_in = client.check_in(&me()).await.unwrap();
    assert_eq!(checked_in.check_in_time.as_deref(), Some("2026-10-14T09:00:00Z"));
    assert_eq!(checked_in.total_minutes, None);

    let checked_out = client.check_out(&me()).await.unwrap();
    assert_eq!(checked_out.total_minutes, Some(480.0));
}

#[tokio::test]
async fn history_sends_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checkin/history"))
        .and(query_param("employeeId", "EMP-0042"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "history": [
                {
                    "date": "2026-10-13",
                    "checkInTime": "2026-10-13T09:00:00Z",
                    "checkOutTime": "2026-10-13T17:00:00Z",
                    "totalHours": 8
                },
                {
                    "date": "2026-10-12",
                    "checkInTime": "2026-10-12T09:00:00Z",
                    "checkOutTime": null,
                    "totalHours": 0,
                    "totalMinutes": 95
                }
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (settings, _dir) = build_settings(&server.uri()).unwrap();
    let client = settings.api_client(None).unwrap();
    let history = client.history(&me(), 5).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].minutes(), 480.0);
    assert_eq!(history[1].minutes(), 95.0);
    assert_eq!(history[1].check_out_time, None);
}

#[tokio::test]
async fn unsuccessful_envelope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Already checked in"
        })))
        .mount(&server)
        .await;

    let (settings, _dir) = build_settings(&server.uri()).unwrap();
    let client = settings.api_client(None).unwrap();
    let err = client.check_in(&me()).await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected(_)));
    assert_eq!(err.message(), "Already checked in");
}

#[tokio::test]
async fn http_errors_carry_the_server_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "Not checked in"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/checkin/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (settings, _dir) = build_settings(&server.uri()).unwrap();
    let client = settings.api_client(None).unwrap();

    let err = client.check_out(&me()).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { .. }));
    assert_eq!(err.message(), "Not checked in");

    let err = client.status(&me()).await.unwrap_err();
    assert!(matches!(err, ApiError::Unavailable));

    let err = client.dashboard(&me()).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { reason: None, .. }));
}

#[tokio::test]
async fn empty_status_payload_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checkin/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let (settings, _dir) = build_settings(&server.uri()).unwrap();
    let client = settings.api_client(None).unwrap();

    assert!(matches!(
        client.status(&me()).await,
        Err(ApiError::MissingData)
    ));
}
