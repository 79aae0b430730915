use crate::error::{IopgpsError, Result};
use crate::iopgps_api::iopgps_client::IopgpsApiTrait;
use crate::iopgps_api::models::device::Device;
use crate::tracker::tracked_device::TrackedDevice;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome of one update cycle.
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// All known devices after the cycle, in vendor order.
    pub devices: Vec<TrackedDevice>,
    /// IMEIs seen for the first time.
    pub added: Vec<String>,
    /// Devices the account no longer reports whose entities are not deleted yet.
    /// They stay here every cycle until [`AccountTracker::confirm_removed`].
    pub removed: Vec<TrackedDevice>,
    /// Per-device telemetry failures. The affected devices keep their last values.
    pub failed: Vec<IopgpsError>,
}

/// Owns the device state of one configured account.
pub struct AccountTracker<T>
where
    T: IopgpsApiTrait,
{
    guid: String,
    entry_name: String,
    client: T,
    // held for the whole cycle, so updates of one account never overlap
    devices: Mutex<Vec<TrackedDevice>>,
    pending_removal: Mutex<Vec<TrackedDevice>>,
}

impl<T> AccountTracker<T>
where
    T: IopgpsApiTrait + Send + Sync,
{
    pub fn new(guid: &str, entry_name: &str, client: T) -> Self {
        Self {
            guid: guid.to_string(),
            entry_name: entry_name.to_string(),
            client,
            devices: Mutex::new(Vec::new()),
            pending_removal: Mutex::new(Vec::new()),
        }
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    /// Validates the account credentials by obtaining a first token.
    pub async fn setup(&self) -> Result<()> {
        let token = self.client.obtain_token().await?;
        info!(
            "Account \"{}\" authenticated, token valid until {}",
            self.entry_name, token.expires_at
        );
        Ok(())
    }

    pub async fn devices(&self) -> Vec<TrackedDevice> {
        self.devices.lock().await.clone()
    }

    pub async fn device(&self, imei: &str) -> Option<TrackedDevice> {
        self.devices
            .lock()
            .await
            .iter()
            .find(|d| d.imei == imei)
            .cloned()
    }

    /// Devices waiting for their entities to be deleted.
    pub async fn pending_removals(&self) -> Vec<TrackedDevice> {
        self.pending_removal.lock().await.clone()
    }

    /// Drops a device from the pending removals once its entities are gone.
    pub async fn confirm_removed(&self, imei: &str) {
        self.pending_removal.lock().await.retain(|d| d.imei != imei);
    }

    /// Runs one discovery + telemetry cycle.
    ///
    /// Discovery failures return the error and leave the known devices untouched.
    /// Telemetry failures are collected per device in the report.
    pub async fn update(&self) -> Result<UpdateReport> {
        let mut devices = self.devices.lock().await;

        self.client.ensure_valid_token().await?;
        let listed = self.client.list_devices().await?.data;

        let (merged, added, removed) = merge_devices(&devices, &listed);
        *devices = merged;
        if !added.is_empty() {
            info!("Account \"{}\": discovered {:?}", self.entry_name, added);
        }
        let removed = {
            let mut pending = self.pending_removal.lock().await;
            // a device that came back is no longer up for removal
            pending.retain(|p| !devices.iter().any(|d| d.imei == p.imei));
            for gone in removed {
                info!(
                    "Account \"{}\": device {} ({}) no longer reported",
                    self.entry_name, gone.imei, gone.name
                );
                if !pending.iter().any(|p| p.imei == gone.imei) {
                    pending.push(gone);
                }
            }
            pending.clone()
        };

        let mut failed = Vec::new();
        for device in devices.iter_mut() {
            match self.client.get_device_detail(&device.imei).await {
                Ok(detail) => device.set_battery(detail.battery_percentage()),
                Err(e) => {
                    warn!("Battery update failed for {}: {}", device.imei, e);
                    failed.push(e);
                }
            }
            match self.client.get_location(&device.imei).await {
                Ok(location) => device.set_location(&location),
                Err(e) => {
                    warn!("Location update failed for {}: {}", device.imei, e);
                    failed.push(e);
                }
            }
        }
        debug!(
            "Account \"{}\": updated {} devices, {} failures",
            self.entry_name,
            devices.len(),
            failed.len()
        );

        Ok(UpdateReport {
            devices: devices.clone(),
            added,
            removed,
            failed,
        })
    }
}

/// Merges a fresh device listing into the known devices.
///
/// Returns the new vendor-ordered list, the IMEIs added and the devices removed.
/// Known devices keep their telemetry; duplicate IMEIs in the listing are ignored.
pub fn merge_devices(
    known: &[TrackedDevice],
    listed: &[Device],
) -> (Vec<TrackedDevice>, Vec<String>, Vec<TrackedDevice>) {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(listed.len());
    let mut added = Vec::new();

    for device in listed {
        if device.imei.is_empty() || !seen.insert(device.imei.clone()) {
            continue;
        }
        match known.iter().find(|k| k.imei == device.imei) {
            Some(existing) => {
                let mut existing = existing.clone();
                existing.refresh_identity(device);
                merged.push(existing);
            }
            None => {
                added.push(device.imei.clone());
                merged.push(TrackedDevice::new(device));
            }
        }
    }

    let removed = known
        .iter()
        .filter(|k| !seen.contains(&k.imei))
        .cloned()
        .collect();

    (merged, added, removed)
}
