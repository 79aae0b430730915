use crate::home_assistant::topics::Topics;
use crate::tracker::tracked_device::TrackedDevice;
use dashmap::DashMap;
use std::sync::Arc;

pub mod battery_processor;
pub mod device_tracker_processor;
pub mod removal_processor;

/// Trait for a processor that turns tracker state into Home Assistant messages
pub trait TrackedDeviceProcessor: Send + Sync + 'static {
    fn handle(
        &self,
        device: &TrackedDevice,
        processor_state: &ProcessorState,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Discovery configs already on the broker, by unique id.
pub type PublishedDiscovery = Arc<DashMap<String, String>>;

pub struct ProcessorState {
    pub account_guid: String,
    pub topics: Topics,
    pub published_discovery: PublishedDiscovery,
}

impl ProcessorState {
    /// Records `payload` as the discovery config of `unique_id`.
    /// Returns true when it differs from what was last published.
    pub fn needs_discovery(&self, unique_id: &str, payload: &str) -> bool {
        match self
            .published_discovery
            .insert(unique_id.to_string(), payload.to_string())
        {
            Some(previous) => previous != payload,
            None => true,
        }
    }

    /// Forgets a discovery config so the next update publishes it again.
    pub fn forget_discovery(&self, unique_id: &str) {
        self.published_discovery.remove(unique_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_is_published_once_per_payload() {
        let state = ProcessorState {
            account_guid: "g".to_string(),
            topics: Topics::default(),
            published_discovery: Arc::new(DashMap::new()),
        };
        assert!(state.needs_discovery("a", "{}"));
        assert!(!state.needs_discovery("a", "{}"));
        assert!(state.needs_discovery("a", "{\"name\":\"renamed\"}"));
        state.forget_discovery("a");
        assert!(state.needs_discovery("a", "{\"name\":\"renamed\"}"));
    }
}
