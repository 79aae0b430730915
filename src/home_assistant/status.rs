use crate::home_assistant::topics::Topics;
use crate::processors::PublishedDiscovery;
use rumqttc::{ConnectionError, Event, Packet};
use tracing::{debug, error, info, trace, warn};

/// Birth/will messages Home Assistant publishes on `{prefix}/status`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HaStatus {
    Online,
    Offline,
}

pub fn status_topic_parser(topics: &Topics, topic: &str, payload: &str) -> Option<HaStatus> {
    if topic != topics.ha_status() {
        return None;
    }
    match payload.trim() {
        "online" => Some(HaStatus::Online),
        "offline" => Some(HaStatus::Offline),
        other => {
            warn!("Unexpected payload {:?} on {}", other, topic);
            None
        }
    }
}

/// What the event loop has to do after an event of the Home Assistant connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HaEventOutcome {
    /// (Re)connected: subscribe to the HA status topic and announce the bridge.
    Connected,
    /// Connection failed: back off before polling the event loop again.
    Disconnected,
    Ignored,
}

/// Handles one event of the Home Assistant connection.
///
/// Every (re)connect, connection error and HA birth message clears the published
/// discovery set, so the next poll publishes all discovery configs again.
pub fn handle_ha_event(
    event: &Result<Event, ConnectionError>,
    topics: &Topics,
    published_discovery: &PublishedDiscovery,
) -> HaEventOutcome {
    match event {
        Ok(Event::Incoming(Packet::ConnAck(_))) => {
            info!("Connected to Home Assistant MQTT broker");
            published_discovery.clear();
            HaEventOutcome::Connected
        }
        Ok(Event::Incoming(Packet::Publish(p))) => {
            let payload = String::from_utf8_lossy(&p.payload);
            match status_topic_parser(topics, &p.topic, &payload) {
                Some(HaStatus::Online) => {
                    debug!("Home Assistant came online, forcing rediscovery");
                    published_discovery.clear();
                }
                Some(HaStatus::Offline) => debug!("Home Assistant went offline"),
                None => warn!("Ignoring message on {:?}", p.topic),
            }
            HaEventOutcome::Ignored
        }
        Ok(e) => {
            trace!("{:?}", e);
            HaEventOutcome::Ignored
        }
        Err(e) => {
            error!(
                "HA event loop failed: {:?}. Forcing rediscovery on reconnect",
                e
            );
            published_discovery.clear();
            HaEventOutcome::Disconnected
        }
    }
}
