use crate::home_assistant::availability::Availability;
use crate::home_assistant::device::Device;
use serde::{Deserialize, Serialize};

pub const COMPONENT: &str = "sensor";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SensorDiscoveryPayload {
    pub device: Device,
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<Availability>>,
}
