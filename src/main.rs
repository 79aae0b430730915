use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

use dashmap::DashMap;
use iopgps_mqtt_bridge::config::{Config, ConfigError, LoggingConfig};
use iopgps_mqtt_bridge::home_assistant::availability::AvailabilityState;
use iopgps_mqtt_bridge::home_assistant::status::{HaEventOutcome, handle_ha_event};
use iopgps_mqtt_bridge::home_assistant::topics::{BRIDGE_AVAILABILITY_TOPIC, Topics};
use iopgps_mqtt_bridge::iopgps_api::cached_iopgps_client::CachedIopgpsClient;
use iopgps_mqtt_bridge::iopgps_api::iopgps_client::IopgpsClient;
use iopgps_mqtt_bridge::poller::{AccountProcessors, PollerSettings, run_account};
use iopgps_mqtt_bridge::processors::{ProcessorState, PublishedDiscovery};
use iopgps_mqtt_bridge::tracker::account_tracker::AccountTracker;
use rumqttc::{AsyncClient, EventLoop, LastWill, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::util::SubscriberInitExt;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // Load configuration
    let mut config = match Config::load_or_create(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            if let Some(ConfigError::ExampleCreated(path)) = e.downcast_ref::<ConfigError>() {
                println!("Config file not found. Created example {}", path);
                println!("Please edit it with your settings and restart the application.");
            }
            return Err(e);
        }
    };
    if config.assign_missing_guids() {
        // guids end up in entity ids, so they must survive restarts
        config.save(CONFIG_PATH)?;
    }
    config.validate()?;

    init_tracing(&config.logging);

    let topics = Topics::new(&config.home_assistant.discovery_prefix);

    let mut ha_options = MqttOptions::new(
        &config.home_assistant.client_id,
        &config.home_assistant.mqtt_host,
        config.home_assistant.mqtt_port,
    );
    ha_options.set_credentials(
        &config.home_assistant.mqtt_username,
        &config.home_assistant.mqtt_password,
    );
    ha_options.set_keep_alive(Duration::from_secs(
        config.intervals.mqtt_keep_alive_seconds,
    ));
    ha_options.set_last_will(LastWill::new(
        BRIDGE_AVAILABILITY_TOPIC,
        AvailabilityState::Offline.as_str(),
        QoS::AtLeastOnce,
        true,
    ));
    let (ha_client, ha_eventloop) = AsyncClient::new(ha_options, config.limits.mqtt_queue_size);

    let published_discovery: PublishedDiscovery = Arc::new(DashMap::new());

    // Run HA event loop in background
    tokio::spawn(run_ha_event_loop(
        ha_eventloop,
        ha_client.clone(),
        topics.clone(),
        published_discovery.clone(),
        Duration::from_secs(config.intervals.reconnect_delay_seconds),
    ));

    let settings = PollerSettings {
        scan_interval: Duration::from_secs(config.intervals.scan_interval_seconds),
        reconnect_delay: Duration::from_secs(config.intervals.reconnect_delay_seconds),
    };

    for account in config.accounts.iter() {
        let client = IopgpsClient::new(
            &config.iopgps.api_url,
            &account.user,
            &account.key,
            Duration::from_secs(config.iopgps.request_timeout_seconds),
        )?;
        let cached_client = CachedIopgpsClient::new(
            client,
            Duration::from_secs(config.intervals.discovery_interval_seconds),
            Duration::from_secs(config.intervals.battery_cache_seconds),
        );
        let tracker = Arc::new(AccountTracker::new(
            &account.guid,
            &account.entry_name,
            cached_client,
        ));
        let processor_state = Arc::new(ProcessorState {
            account_guid: account.guid.clone(),
            topics: topics.clone(),
            published_discovery: published_discovery.clone(),
        });
        let processors = AccountProcessors::new(ha_client.clone());
        let entry_name = account.entry_name.clone();

        tokio::spawn(async move {
            if let Err(e) = run_account(tracker, processors, processor_state, settings).await {
                error!("Account \"{}\" stopped: {:?}", entry_name, e);
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    if let Err(e) = ha_client
        .publish(
            BRIDGE_AVAILABILITY_TOPIC,
            QoS::AtLeastOnce,
            true,
            AvailabilityState::Offline.as_str(),
        )
        .await
    {
        warn!("Unable to publish offline state: {:?}", e);
    }
    // give the event loop a moment to flush the offline message
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    // Directory for logs
    let log_dir = &logging.directory;

    // One file per level
    let debug_file = rolling::daily(log_dir, &logging.debug_file);
    let info_file = rolling::daily(log_dir, &logging.info_file);
    let warn_file = rolling::daily(log_dir, &logging.warn_file);
    let error_file = rolling::daily(log_dir, &logging.error_file);

    let debug_layer = fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    let info_layer = fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::INFO);

    let warn_layer = fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let error_layer = fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

    let console_layer = fmt::layer()
        .pretty()
        .with_filter(EnvFilter::new(&logging.console_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(debug_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .init();
}

/// Drives the Home Assistant connection.
async fn run_ha_event_loop(
    mut ha_eventloop: EventLoop,
    ha_client: AsyncClient,
    topics: Topics,
    published_discovery: PublishedDiscovery,
    reconnect_delay: Duration,
) {
    loop {
        let event = ha_eventloop.poll().await;
        match handle_ha_event(&event, &topics, &published_discovery) {
            HaEventOutcome::Connected => {
                // try_* only: awaiting the request channel here would stall the loop that drains it
                if let Err(e) = ha_client.try_subscribe(topics.ha_status(), QoS::AtLeastOnce) {
                    error!("Failed to subscribe to {}: {:?}", topics.ha_status(), e);
                }
                if let Err(e) = ha_client.try_publish(
                    BRIDGE_AVAILABILITY_TOPIC,
                    QoS::AtLeastOnce,
                    true,
                    AvailabilityState::Online.as_str(),
                ) {
                    error!(
                        "Error occurred while publishing to {}: {:?}",
                        BRIDGE_AVAILABILITY_TOPIC, e
                    );
                }
            }
            HaEventOutcome::Disconnected => tokio::time::sleep(reconnect_delay).await,
            HaEventOutcome::Ignored => {}
        }
    }
}
