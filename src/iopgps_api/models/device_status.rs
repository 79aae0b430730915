use crate::iopgps_api::models::number_or_string;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceStatus {
    #[serde(
        rename = "batteryPercentage",
        default,
        deserialize_with = "number_or_string::optional_i64"
    )]
    pub battery_percentage: Option<i64>,
}
