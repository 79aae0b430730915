use crate::home_assistant::availability::Availability;
use crate::home_assistant::device::Device;
use crate::tracker::tracked_device::TrackedDevice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COMPONENT: &str = "device_tracker";

/// MQTT discovery config for a GPS device tracker.
///
/// Location comes from `latitude`/`longitude` in the JSON attributes topic; no
/// state topic is configured.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceTrackerDiscoveryPayload {
    pub device: Device,
    pub name: String,
    pub unique_id: String,
    pub json_attributes_topic: String,
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<Availability>>,
}

/// Attributes published for a tracker. Home Assistant reads the location from here.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeviceTrackerAttributes {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub imei: String,
}

impl DeviceTrackerAttributes {
    /// None until the tracker has reported a first fix.
    pub fn from_tracked(tracked: &TrackedDevice) -> Option<Self> {
        let position = tracked.position.as_ref()?;
        Some(Self {
            latitude: position.latitude,
            longitude: position.longitude,
            battery_level: tracked.battery_level,
            address: position.address.clone(),
            gps_time: position.gps_time,
            mobile: tracked.mobile.clone(),
            imei: tracked.imei.clone(),
        })
    }
}
