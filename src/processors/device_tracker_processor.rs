use crate::home_assistant::availability::{Availability, AvailabilityState};
use crate::home_assistant::device::Device;
use crate::home_assistant::device_tracker::{
    COMPONENT, DeviceTrackerAttributes, DeviceTrackerDiscoveryPayload,
};
use crate::home_assistant::topics::{BRIDGE_AVAILABILITY_TOPIC, Topics};
use crate::mqtt_publisher::MqttPublisher;
use crate::processors::{ProcessorState, TrackedDeviceProcessor};
use crate::tracker::tracked_device::TrackedDevice;
use rumqttc::QoS;
use tracing::{error, trace};

/// Publishes the `device_tracker` entity of a tracker: discovery once, then its location attributes.
#[derive(Clone)]
pub struct DeviceTrackerProcessor<P>
where
    P: MqttPublisher,
{
    pub ha_client: P,
}

impl<P: MqttPublisher> DeviceTrackerProcessor<P> {
    pub fn discovery_payload(
        account_guid: &str,
        device: &TrackedDevice,
    ) -> DeviceTrackerDiscoveryPayload {
        DeviceTrackerDiscoveryPayload {
            device: Device::for_tracker(account_guid, device),
            name: format!("{} Location", device.name),
            unique_id: Topics::tracker_unique_id(account_guid, &device.imei),
            json_attributes_topic: Topics::location_attributes(account_guid, &device.imei),
            source_type: "gps".to_string(),
            icon: Some("mdi:map-marker".to_string()),
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

impl<P: MqttPublisher> TrackedDeviceProcessor for DeviceTrackerProcessor<P> {
    async fn handle(
        &self,
        device: &TrackedDevice,
        processor_state: &ProcessorState,
    ) -> anyhow::Result<()> {
        let guid = &processor_state.account_guid;
        let discovery_object = Self::discovery_payload(guid, device);
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

        if let Some(attributes) = DeviceTrackerAttributes::from_tracked(device) {
            self.ha_client
                .publish(
                    &discovery_object.json_attributes_topic,
                    QoS::AtLeastOnce,
                    true,
                    serde_json::to_string(&attributes)?,
                )
                .await?;
        }

        self.ha_client
            .publish(
                Topics::device_availability(guid, &device.imei),
                QoS::AtLeastOnce,
                true,
                AvailabilityState::Online.as_str(),
            )
            .await?;
        Ok(())
    }
}
