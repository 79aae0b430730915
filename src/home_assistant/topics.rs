//! MQTT topic layout.
//!
//! Entity state lives under `iopgps/{account guid}/{imei}/...`; discovery configs
//! under `{discovery prefix}/{component}/{unique id}/config`.

pub const BRIDGE_AVAILABILITY_TOPIC: &str = "iopgps/bridge/availability";
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

#[derive(Debug, Clone, PartialEq)]
pub struct Topics {
    pub discovery_prefix: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_PREFIX)
    }
}

impl Topics {
    pub fn new(discovery_prefix: &str) -> Self {
        Self {
            discovery_prefix: discovery_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn discovery(&self, component: &str, unique_id: &str) -> String {
        format!("{}/{}/{}/config", self.discovery_prefix, component, unique_id)
    }

    /// Home Assistant announces `online` here after it (re)starts.
    pub fn ha_status(&self) -> String {
        format!("{}/status", self.discovery_prefix)
    }

    pub fn tracker_unique_id(guid: &str, imei: &str) -> String {
        format!("iopgps_{}_{}_gps", guid, imei)
    }

    pub fn battery_unique_id(guid: &str, imei: &str) -> String {
        format!("iopgps_{}_{}_battery", guid, imei)
    }

    pub fn location_attributes(guid: &str, imei: &str) -> String {
        format!("iopgps/{}/{}/location/attributes", guid, imei)
    }

    pub fn battery_state(guid: &str, imei: &str) -> String {
        format!("iopgps/{}/{}/battery/state", guid, imei)
    }

    pub fn device_availability(guid: &str, imei: &str) -> String {
        format!("iopgps/{}/{}/availability", guid, imei)
    }
}
