use crate::error::{IopgpsError, Result};
use crate::iopgps_api::iopgps_client::IopgpsApiTrait;
use crate::iopgps_api::models::auth_token::AuthToken;
use crate::iopgps_api::models::location::Location;
use crate::iopgps_api::models::response::device_detail_response::DeviceDetailResponse;
use crate::iopgps_api::models::response::devices_response::DevicesResponse;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Wraps an API client with TTL caches so device discovery and battery reads run at a
/// slower cadence than location polling.
#[derive(Clone)]
pub struct CachedIopgpsClient<T>
where
    T: IopgpsApiTrait,
{
    client: T,
    devices_cache: Cache<&'static str, DevicesResponse>,
    detail_cache: Cache<String, DeviceDetailResponse>,
}

impl<T> CachedIopgpsClient<T>
where
    T: IopgpsApiTrait,
{
    pub fn new(client: T, discovery_ttl: Duration, detail_ttl: Duration) -> Self {
        Self {
            client,
            devices_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(discovery_ttl)
                .build(),
            detail_cache: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(detail_ttl)
                .build(),
        }
    }
}

fn unwrap_shared(e: Arc<IopgpsError>) -> IopgpsError {
    Arc::try_unwrap(e).unwrap_or_else(|shared| (*shared).clone())
}

impl<T> IopgpsApiTrait for CachedIopgpsClient<T>
where
    T: IopgpsApiTrait + Send + Sync,
{
    async fn obtain_token(&self) -> Result<AuthToken> {
        self.client.obtain_token().await
    }

    async fn ensure_valid_token(&self) -> Result<AuthToken> {
        self.client.ensure_valid_token().await
    }

    async fn invalidate_token(&self) {
        self.client.invalidate_token().await
    }

    async fn list_devices(&self) -> Result<DevicesResponse> {
        self.devices_cache
            .try_get_with("devices", async { self.client.list_devices().await })
            .await
            .map_err(unwrap_shared)
    }

    async fn get_device_detail(&self, imei: &str) -> Result<DeviceDetailResponse> {
        let key = imei.to_string();

        self.detail_cache
            .try_get_with(
                key.clone(),
                async move { self.client.get_device_detail(&key).await },
            )
            .await
            .map_err(unwrap_shared)
    }

    async fn get_location(&self, imei: &str) -> Result<Location> {
        // positions are the point of polling; never cached
        self.client.get_location(imei).await
    }
}
