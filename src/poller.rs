use crate::home_assistant::availability::AvailabilityState;
use crate::home_assistant::topics::BRIDGE_AVAILABILITY_TOPIC;
use crate::iopgps_api::iopgps_client::IopgpsApiTrait;
use crate::mqtt_publisher::MqttPublisher;
use crate::processors::battery_processor::BatteryProcessor;
use crate::processors::device_tracker_processor::DeviceTrackerProcessor;
use crate::processors::removal_processor::RemovalProcessor;
use crate::processors::{ProcessorState, TrackedDeviceProcessor};
use crate::tracker::account_tracker::{AccountTracker, UpdateReport};
use rumqttc::QoS;
use std::sync::Arc;
use std::time::Duration;
use tokio::join;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    pub scan_interval: Duration,
    pub reconnect_delay: Duration,
}

#[derive(Clone)]
pub struct AccountProcessors<P>
where
    P: MqttPublisher,
{
    pub device_tracker: DeviceTrackerProcessor<P>,
    pub battery: BatteryProcessor<P>,
    pub removal: RemovalProcessor<P>,
    pub ha_client: P,
}

impl<P: MqttPublisher> AccountProcessors<P> {
    pub fn new(ha_client: P) -> Self {
        Self {
            device_tracker: DeviceTrackerProcessor {
                ha_client: ha_client.clone(),
            },
            battery: BatteryProcessor {
                ha_client: ha_client.clone(),
            },
            removal: RemovalProcessor {
                ha_client: ha_client.clone(),
            },
            ha_client,
        }
    }
}

/// Authenticates the account, retrying transient failures.
///
/// Rejected credentials are returned as an error; the account is then never polled.
pub async fn setup_account<T>(
    tracker: &AccountTracker<T>,
    settings: &PollerSettings,
) -> anyhow::Result<()>
where
    T: IopgpsApiTrait + Send + Sync,
{
    loop {
        match tracker.setup().await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_auth() => {
                error!(
                    "Account \"{}\" rejected by IOPGPS, not creating any entities: {}",
                    tracker.entry_name(),
                    e
                );
                return Err(e.into());
            }
            Err(e) => {
                warn!(
                    "Account \"{}\" setup failed, retrying in {:?}: {}",
                    tracker.entry_name(),
                    settings.reconnect_delay,
                    e
                );
                tokio::time::sleep(settings.reconnect_delay).await;
            }
        }
    }
}

/// Runs one update cycle and publishes its outcome to Home Assistant.
pub async fn poll_once<T, P>(
    tracker: &AccountTracker<T>,
    processors: &AccountProcessors<P>,
    processor_state: &ProcessorState,
) -> anyhow::Result<UpdateReport>
where
    T: IopgpsApiTrait + Send + Sync,
    P: MqttPublisher,
{
    let report = tracker.update().await?;

    for gone in &report.removed {
        match processors.removal.handle(gone, processor_state).await {
            Ok(()) => tracker.confirm_removed(&gone.imei).await,
            Err(e) => warn!(
                "Error occurred while removing device {}, retrying next tick: {:?}",
                gone.imei, e
            ),
        }
    }

    let mut publish_failures = 0;
    for device in &report.devices {
        let (tracker_result, battery_result) = join!(
            processors.device_tracker.handle(device, processor_state),
            processors.battery.handle(device, processor_state)
        );
        publish_failures += log_publish_failures(
            &device.imei,
            [("location", tracker_result), ("battery", battery_result)],
        );
    }
    if publish_failures > 0 {
        warn!(
            "Account \"{}\": {} entity updates not published",
            tracker.entry_name(),
            publish_failures
        );
    }

    processors
        .ha_client
        .publish(
            BRIDGE_AVAILABILITY_TOPIC,
            QoS::AtLeastOnce,
            true,
            AvailabilityState::Online.as_str(),
        )
        .await?;

    Ok(report)
}

/// Logs each failed processor result of one device. Returns the number of failures.
fn log_publish_failures<const N: usize>(
    imei: &str,
    results: [(&str, anyhow::Result<()>); N],
) -> usize {
    let mut failures = 0;
    for (entity, result) in results {
        if let Err(e) = result {
            error!(
                "Error occurred while publishing {} of {}: {:?}",
                entity, imei, e
            );
            failures += 1;
        }
    }
    failures
}

/// Polls one account forever at the scan interval.
pub async fn run_account<T, P>(
    tracker: Arc<AccountTracker<T>>,
    processors: AccountProcessors<P>,
    processor_state: Arc<ProcessorState>,
    settings: PollerSettings,
) -> anyhow::Result<()>
where
    T: IopgpsApiTrait + Send + Sync,
    P: MqttPublisher,
{
    setup_account(&tracker, &settings).await?;
    info!(
        "Polling account \"{}\" every {:?}",
        tracker.entry_name(),
        settings.scan_interval
    );

    let mut tick = tokio::time::interval(settings.scan_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tick.tick().await;
        match poll_once(&tracker, &processors, &processor_state).await {
            Ok(report) => debug!(
                "Account \"{}\": {} devices, {} telemetry failures",
                tracker.entry_name(),
                report.devices.len(),
                report.failed.len()
            ),
            Err(e) => warn!(
                "Update of account \"{}\" failed, keeping last known state: {:?}",
                tracker.entry_name(),
                e
            ),
        }
    }
}
