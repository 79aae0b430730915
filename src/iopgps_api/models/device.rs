use crate::iopgps_api::models::number_or_string;
use serde::{Deserialize, Serialize};

/// A tracker as listed by `GET /api/device`.
/// `imei` is the vendor device id; the printed serial is never used as identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Device {
    #[serde(deserialize_with = "number_or_string::string_or_number")]
    pub imei: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile: Option<String>,
}

impl Device {
    /// Name shown in Home Assistant; falls back to the IMEI when the tracker is unnamed.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.imei.clone()
        } else {
            self.name.clone()
        }
    }
}
