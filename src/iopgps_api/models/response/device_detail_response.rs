use crate::iopgps_api::models::device_status::DeviceStatus;
use crate::iopgps_api::models::response::api_status::ApiStatus;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceDetailResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub data: Option<DeviceDetail>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceDetail {
    #[serde(rename = "deviceStatus")]
    pub device_status: Option<DeviceStatus>,
}

impl DeviceDetailResponse {
    pub fn battery_percentage(&self) -> Option<i64> {
        self.data
            .as_ref()?
            .device_status
            .as_ref()?
            .battery_percentage
    }
}
