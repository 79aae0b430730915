use crate::home_assistant::topics::Topics;
use crate::home_assistant::{device_tracker, sensor};
use crate::mqtt_publisher::MqttPublisher;
use crate::processors::{ProcessorState, TrackedDeviceProcessor};
use crate::tracker::tracked_device::TrackedDevice;
use rumqttc::QoS;
use tracing::info;

/// Deletes the entities of a tracker the account no longer reports.
///
/// An empty retained discovery config removes the entity from Home Assistant;
/// the retained state topics are cleared the same way.
#[derive(Clone)]
pub struct RemovalProcessor<P>
where
    P: MqttPublisher,
{
    pub ha_client: P,
}

impl<P: MqttPublisher> TrackedDeviceProcessor for RemovalProcessor<P> {
    async fn handle(
        &self,
        device: &TrackedDevice,
        processor_state: &ProcessorState,
    ) -> anyhow::Result<()> {
        let guid = &processor_state.account_guid;
        let tracker_id = Topics::tracker_unique_id(guid, &device.imei);
        let battery_id = Topics::battery_unique_id(guid, &device.imei);

        let cleared = [
            processor_state
                .topics
                .discovery(device_tracker::COMPONENT, &tracker_id),
            processor_state.topics.discovery(sensor::COMPONENT, &battery_id),
            Topics::location_attributes(guid, &device.imei),
            Topics::battery_state(guid, &device.imei),
            Topics::device_availability(guid, &device.imei),
        ];
        // forgotten first, so a device that returns after a failed removal is rediscovered
        processor_state.forget_discovery(&tracker_id);
        processor_state.forget_discovery(&battery_id);
        for topic in cleared {
            self.ha_client
                .publish(topic, QoS::AtLeastOnce, true, "")
                .await?;
        }

        info!("Removed entities of device {} ({})", device.imei, device.name);
        Ok(())
    }
}
