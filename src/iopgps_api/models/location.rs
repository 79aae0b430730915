use crate::iopgps_api::models::number_or_string;
use crate::iopgps_api::models::response::api_status::ApiStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /api/device/location`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Location {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default, deserialize_with = "number_or_string::optional_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "number_or_string::optional_f64")]
    pub lng: Option<f64>,
    #[serde(rename = "gpsTime", default, deserialize_with = "number_or_string::optional_i64")]
    pub gps_time: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Location {
    /// Latitude/longitude pair, only when both are present and in range.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
            {
                Some((lat, lng))
            }
            _ => None,
        }
    }

    /// `gpsTime` is epoch seconds; tolerate milliseconds as well.
    pub fn gps_time_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.gps_time?;
        if raw >= 1_000_000_000_000 {
            DateTime::from_timestamp_millis(raw)
        } else {
            DateTime::from_timestamp(raw, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_coordinates() {
        let body = r#"{"code":0,"lat":"22.5431","lng":"113.9472","gpsTime":1768713467,"address":"Shenzhen"}"#;
        let loc: Location = serde_json::from_str(body).unwrap();
        assert_eq!(loc.coordinates(), Some((22.5431, 113.9472)));
        assert_eq!(loc.gps_time_utc().unwrap().timestamp(), 1768713467);
        assert_eq!(loc.address.as_deref(), Some("Shenzhen"));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let loc: Location = serde_json::from_str(r#"{"lat":"95.0","lng":"10.0"}"#).unwrap();
        assert_eq!(loc.coordinates(), None);
    }

    #[test]
    fn millisecond_gps_time() {
        let loc: Location = serde_json::from_str(r#"{"gpsTime":1768713467000}"#).unwrap();
        assert_eq!(loc.gps_time_utc().unwrap().timestamp(), 1768713467);
    }
}
