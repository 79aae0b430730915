use crate::tracker::tracked_device::TrackedDevice;
use serde::{Deserialize, Serialize};

pub const MANUFACTURER: &str = "IOPGPS";
pub const MODEL: &str = "GPS Tracker";

/// Device block shared by every entity of one tracker.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Device {
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
}

impl Device {
    pub fn for_tracker(account_guid: &str, tracked: &TrackedDevice) -> Self {
        Self {
            identifiers: vec![format!("{}_{}", account_guid, tracked.imei)],
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
            name: tracked.name.clone(),
            sw_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}
