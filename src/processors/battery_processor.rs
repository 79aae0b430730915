use crate::home_assistant::availability::Availability;
use crate::home_assistant::device::Device;
use crate::home_assistant::sensor::{COMPONENT, SensorDiscoveryPayload};
use crate::home_assistant::topics::{BRIDGE_AVAILABILITY_TOPIC, Topics};
use crate::mqtt_publisher::MqttPublisher;
use crate::processors::{ProcessorState, TrackedDeviceProcessor};
use crate::tracker::tracked_device::TrackedDevice;
use rumqttc::QoS;
use tracing::{error, trace};

/// Publishes the battery level sensor of a tracker.
#[derive(Clone)]
pub struct BatteryProcessor<P>
where
    P: MqttPublisher,
{
    pub ha_client: P,
}

impl<P: MqttPublisher> BatteryProcessor<P> {
    pub fn discovery_payload(account_guid: &str, device: &TrackedDevice) -> SensorDiscoveryPayload {
        SensorDiscoveryPayload {
            device: Device::for_tracker(account_guid, device),
            name: format!("{} Battery Level", device.name),
            unique_id: Topics::battery_unique_id(account_guid, &device.imei),
            state_topic: Topics::battery_state(account_guid, &device.imei),
            device_class: Some("battery".to_string()),
            unit_of_measurement: Some("%".to_string()),
            state_class: Some("measurement".to_string()),
            availability: Some(vec![
                Availability::online_offline(BRIDGE_AVAILABILITY_TOPIC),
                Availability::online_offline(&Topics::device_availability(
                    account_guid,
                    &device.imei,
                )),
            ]),
        }
    }
}

impl<P: MqttPublisher> TrackedDeviceProcessor for BatteryProcessor<P> {
    async fn handle(
        &self,
        device: &TrackedDevice,
        processor_state: &ProcessorState,
    ) -> anyhow::Result<()> {
        let discovery_object = Self::discovery_payload(&processor_state.account_guid, device);
        let unique_id = discovery_object.unique_id.clone();
        let discovery_topic = processor_state.topics.discovery(COMPONENT, &unique_id);
        let discovery_payload = serde_json::to_string(&discovery_object)?;

        if processor_state.needs_discovery(&unique_id, &discovery_payload) {
            trace!("{}", discovery_payload);
            if let Err(e) = self
                .ha_client
                .publish(&discovery_topic, QoS::AtLeastOnce, true, discovery_payload)
                .await
            {
                processor_state.forget_discovery(&unique_id);
                error!("Error publishing to {}: {:?}", discovery_topic, e);
                return Err(e.into());
            }
        }

        // unknown battery: leave the retained value alone
        if let Some(level) = device.battery_level {
            self.ha_client
                .publish(
                    &discovery_object.state_topic,
                    QoS::AtLeastOnce,
                    true,
                    level.to_string(),
                )
                .await?;
        }
        Ok(())
    }
}
