//! Shared helpers: a mock IOPGPS API on top of wiremock.

#![allow(dead_code)]

use iopgps_mqtt_bridge::iopgps_api::iopgps_client::IopgpsClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const APPID: &str = "XX5698";
pub const KEY: &str = "test-key";

pub fn client(server: &MockServer) -> IopgpsClient {
    IopgpsClient::new(
        &format!("{}/api/", server.uri()),
        APPID,
        KEY,
        Duration::from_secs(2),
    )
    .unwrap()
}

pub fn auth_ok(token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 0,
        "accessToken": token,
        "expiresIn": expires_in,
    }))
}

pub async fn mount_auth(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/"))
        .respond_with(auth_ok(token, 7200))
        .mount(server)
        .await;
}

pub async fn mount_devices(server: &MockServer, token: &str, devices: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/device"))
        .and(header("accessToken", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": devices,
        })))
        .mount(server)
        .await;
}

pub async fn mount_detail(server: &MockServer, imei: &str, battery: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/device/detail/"))
        .and(query_param("imei", imei))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "deviceStatus": { "batteryPercentage": battery } },
        })))
        .mount(server)
        .await;
}

pub async fn mount_location(server: &MockServer, imei: &str, lat: &str, lng: &str) {
    Mock::given(method("GET"))
        .and(path("/api/device/location"))
        .and(query_param("imei", imei))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "lat": lat,
            "lng": lng,
            "gpsTime": 1768713467,
            "address": "Somewhere",
        })))
        .mount(server)
        .await;
}
