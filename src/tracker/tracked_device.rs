use crate::iopgps_api::models::device::Device;
use crate::iopgps_api::models::location::Location;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Last known fix of a tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Position {
    pub fn from_location(location: &Location) -> Option<Self> {
        let (latitude, longitude) = location.coordinates()?;
        Some(Self {
            latitude,
            longitude,
            gps_time: location.gps_time_utc(),
            address: location.address.clone().filter(|a| !a.trim().is_empty()),
        })
    }
}

/// One tracker of an account, keyed by IMEI.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDevice {
    pub imei: String,
    pub name: String,
    pub mobile: Option<String>,
    pub battery_level: Option<u8>,
    pub position: Option<Position>,
}

impl TrackedDevice {
    pub fn new(device: &Device) -> Self {
        Self {
            imei: device.imei.clone(),
            name: device.display_name(),
            mobile: device.mobile.clone(),
            battery_level: None,
            position: None,
        }
    }

    /// Applies discovery data. Identity never changes; only descriptive fields do.
    pub fn refresh_identity(&mut self, device: &Device) {
        debug_assert_eq!(self.imei, device.imei);
        self.name = device.display_name();
        self.mobile = device.mobile.clone();
    }

    /// Stores a battery reading; an absent reading leaves the last value in place.
    pub fn set_battery(&mut self, percentage: Option<i64>) {
        if let Some(level) = percentage.map(clamp_battery) {
            self.battery_level = Some(level);
        }
    }

    /// Stores a location; a location without usable coordinates leaves the last fix in place.
    pub fn set_location(&mut self, location: &Location) {
        if let Some(position) = Position::from_location(location) {
            self.position = Some(position);
        }
    }
}

pub fn clamp_battery(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> Device {
        Device {
            imei: "863019175495698".to_string(),
            name: name.to_string(),
            mobile: Some("+100".to_string()),
        }
    }

    #[test]
    fn battery_is_clamped() {
        assert_eq!(clamp_battery(-5), 0);
        assert_eq!(clamp_battery(42), 42);
        assert_eq!(clamp_battery(180), 100);
    }

    #[test]
    fn missing_values_keep_last_known_state() {
        let mut tracked = TrackedDevice::new(&device("Car"));
        tracked.set_battery(Some(80));
        tracked.set_location(&serde_json::from_str(r#"{"lat":"1.5","lng":"2.5"}"#).unwrap());

        tracked.set_battery(None);
        tracked.set_location(&serde_json::from_str(r#"{"lat":null,"lng":null}"#).unwrap());

        assert_eq!(tracked.battery_level, Some(80));
        let position = tracked.position.unwrap();
        assert_eq!((position.latitude, position.longitude), (1.5, 2.5));
    }

    #[test]
    fn rename_keeps_identity() {
        let mut tracked = TrackedDevice::new(&device("Car"));
        tracked.refresh_identity(&device("Van"));
        assert_eq!(tracked.imei, "863019175495698");
        assert_eq!(tracked.name, "Van");
    }

    #[test]
    fn unnamed_device_uses_imei() {
        let tracked = TrackedDevice::new(&device("  "));
        assert_eq!(tracked.name, "863019175495698");
    }
}
