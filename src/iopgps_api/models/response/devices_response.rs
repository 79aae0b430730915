use crate::iopgps_api::models::device::Device;
use crate::iopgps_api::models::response::api_status::ApiStatus;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DevicesResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default)]
    pub data: Vec<Device>,
}
