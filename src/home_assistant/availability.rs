use serde::{Deserialize, Serialize};

/// Availability source of a discovered entity.
///
/// Home Assistant subscribes to `topic` and compares what it receives against
/// `payload_available` / `payload_not_available`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_available: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_not_available: Option<String>,
    pub topic: String,
}

impl Availability {
    pub fn online_offline(topic: &str) -> Self {
        Self {
            payload_available: Some(AvailabilityState::Online.as_str().to_string()),
            payload_not_available: Some(AvailabilityState::Offline.as_str().to_string()),
            topic: topic.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum AvailabilityState {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "offline")]
    Offline,
}

impl AvailabilityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityState::Online => "online",
            AvailabilityState::Offline => "offline",
        }
    }
}
