//! IopgpsClient against a mock IOPGPS API.

use iopgps_mqtt_bridge::error::IopgpsError;
use iopgps_mqtt_bridge::iopgps_api::iopgps_client::{IopgpsApiTrait, IopgpsClient};
use iopgps_mqtt_bridge::iopgps_api::models::request::auth_request::sign;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{APPID, KEY, auth_ok, client, mount_auth, mount_detail, mount_devices, mount_location};

#[tokio::test]
async fn test_obtain_token_sends_signed_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok("token-1234567890-abcdefghij", 7200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let token = client.obtain_token().await.unwrap();

    assert_eq!(token.token, "token-1234567890-abcdefghij");
    assert!(!token.is_expired());
    assert_eq!(client.cached_token().await, Some(token));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["appid"], APPID);
    let time = body["time"].as_str().unwrap();
    assert_eq!(body["signature"], sign(KEY, time));
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid signature"})))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.obtain_token().await.unwrap_err();

    match err {
        IopgpsError::Auth(message) => assert_eq!(message, "invalid signature"),
        other => panic!("expected auth error, got {:?}", other),
    }
    assert!(client.cached_token().await.is_none());
}

#[tokio::test]
async fn test_error_code_in_auth_body_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 1001, "result": "appid not found"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).obtain_token().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_auth_server_failure_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).obtain_token().await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unreachable_api_is_transient() {
    let client = IopgpsClient::new("http://127.0.0.1:9/api/", APPID, KEY, Duration::from_secs(1))
        .unwrap();
    let err = client.obtain_token().await.unwrap_err();
    assert!(err.is_transient(), "unexpected {:?}", err);
}

#[tokio::test]
async fn test_valid_token_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok("tok", 7200))
        .expect(1)
        .mount(&server)
        .await;
    mount_devices(&server, "tok", json!([])).await;

    let client = client(&server);
    client.list_devices().await.unwrap();
    client.list_devices().await.unwrap();
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;
    // lifetime shorter than the expiry buffer: stale as soon as it arrives
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok("tok", 5))
        .expect(2)
        .mount(&server)
        .await;
    mount_devices(&server, "tok", json!([])).await;

    let client = client(&server);
    client.list_devices().await.unwrap();
    client.list_devices().await.unwrap();
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok("old", 7200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok("new", 7200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device"))
        .and(header("accessToken", "old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_devices(&server, "new", json!([{"imei": "1", "name": "Car"}])).await;

    let client = client(&server);
    client.obtain_token().await.unwrap();
    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.data.len(), 1);
    assert_eq!(client.cached_token().await.unwrap().token, "new");
}

#[tokio::test]
async fn test_token_error_in_body_triggers_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok("old", 7200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok("new", 7200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device"))
        .and(header("accessToken", "old"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 10002, "result": "accessToken invalid"})),
        )
        .mount(&server)
        .await;
    mount_devices(&server, "new", json!([])).await;

    let client = client(&server);
    client.obtain_token().await.unwrap();
    assert!(client.list_devices().await.is_ok());
}

#[tokio::test]
async fn test_persistent_token_rejection_is_auth_error() {
    let server = MockServer::start().await;
    mount_auth(&server, "tok").await;
    Mock::given(method("GET"))
        .and(path("/api/device"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server).list_devices().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_device_list_detail_and_location() {
    let server = MockServer::start().await;
    mount_auth(&server, "tok").await;
    mount_devices(
        &server,
        "tok",
        json!([
            {"imei": "863019175495698", "name": "Car", "mobile": "+3161234"},
            {"imei": "863019175495699", "name": "Dog"}
        ]),
    )
    .await;
    mount_detail(&server, "863019175495698", json!(87)).await;
    mount_location(&server, "863019175495698", "52.3702", "4.8952").await;

    let client = client(&server);
    let devices = client.list_devices().await.unwrap().data;
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].imei, "863019175495698");
    assert_eq!(devices[0].mobile.as_deref(), Some("+3161234"));
    assert_eq!(devices[1].mobile, None);

    let detail = client.get_device_detail("863019175495698").await.unwrap();
    assert_eq!(detail.battery_percentage(), Some(87));

    let location = client.get_location("863019175495698").await.unwrap();
    assert_eq!(location.coordinates(), Some((52.3702, 4.8952)));
    assert_eq!(location.address.as_deref(), Some("Somewhere"));
}

#[tokio::test]
async fn test_location_api_error_is_device_unavailable() {
    let server = MockServer::start().await;
    mount_auth(&server, "tok").await;
    Mock::given(method("GET"))
        .and(path("/api/device/location"))
        .and(query_param("imei", "42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "device not found"})))
        .mount(&server)
        .await;

    let err = client(&server).get_location("42").await.unwrap_err();
    match err {
        IopgpsError::DeviceUnavailable { imei, reason } => {
            assert_eq!(imei, "42");
            assert!(reason.contains("device not found"));
        }
        other => panic!("expected device error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_location_server_error_is_transient() {
    let server = MockServer::start().await;
    mount_auth(&server, "tok").await;
    Mock::given(method("GET"))
        .and(path("/api/device/location"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client(&server).get_location("42").await.unwrap_err();
    assert!(err.is_transient());
}
