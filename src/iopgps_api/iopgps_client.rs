use crate::error::{IopgpsError, Result};
use crate::iopgps_api::models::auth_token::AuthToken;
use crate::iopgps_api::models::location::Location;
use crate::iopgps_api::models::request::auth_request::AuthRequest;
use crate::iopgps_api::models::response::api_status::ApiStatus;
use crate::iopgps_api::models::response::auth_response::AuthResponse;
use crate::iopgps_api::models::response::device_detail_response::DeviceDetailResponse;
use crate::iopgps_api::models::response::devices_response::DevicesResponse;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

pub const DEFAULT_API_URL: &str = "https://open.iopgps.com/api/";
const ACCESS_TOKEN_HEADER: &str = "accessToken";

#[derive(Clone)]
pub struct IopgpsClient {
    client: reqwest::Client,
    base_url: String,
    appid: String,
    key: String,
    token: Arc<RwLock<Option<AuthToken>>>,
}

impl IopgpsClient {
    pub fn new(base_url: &str, appid: &str, key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| IopgpsError::Api(format!("Unable to build HTTP client: {}", e)))?;

        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            client,
            base_url,
            appid: appid.to_string(),
            key: key.to_string(),
            token: Arc::new(Default::default()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token currently held in the cache, expired or not.
    pub async fn cached_token(&self) -> Option<AuthToken> {
        self.token.read().await.clone()
    }

    async fn get_with_token<T>(&self, path: &str, query: &[(&str, &str)], token: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(self.url(path))
            .header(ACCESS_TOKEN_HEADER, token)
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let contents = response.text().await?;
        classify_status(status, &contents)?;

        let api_status: ApiStatus = serde_json::from_str(&contents).unwrap_or_default();
        if let Some(message) = api_status.error_message() {
            return Err(if message.to_ascii_lowercase().contains("token") {
                IopgpsError::Auth(message)
            } else {
                IopgpsError::Api(message)
            });
        }

        serde_json::from_str(&contents).map_err(|e| {
            IopgpsError::Deserialize(format!("{}. Body was: \"{}\"", e, contents))
        })
    }

    /// GET with the cached token; an auth rejection drops the token and retries once.
    async fn authorized_get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let token = self.ensure_valid_token().await?;
        match self.get_with_token(path, query, &token.token).await {
            Err(e) if e.is_auth() => {
                warn!("Token rejected on {}, re-authenticating: {}", path, e);
                self.invalidate_token().await;
                let token = self.ensure_valid_token().await?;
                self.get_with_token(path, query, &token.token).await
            }
            other => other,
        }
    }
}

/// Maps non-success HTTP statuses onto error kinds.
fn classify_status(status: StatusCode, contents: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ApiStatus>(contents)
        .ok()
        .and_then(|s| s.error_message())
        .unwrap_or_else(|| format!("HTTP {}: {}", status, contents));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(IopgpsError::Auth(message))
    } else if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        Err(IopgpsError::TransientNetwork(message))
    } else {
        Err(IopgpsError::Api(message))
    }
}

impl IopgpsApiTrait for IopgpsClient {
    async fn obtain_token(&self) -> Result<AuthToken> {
        let now = Utc::now().timestamp();
        let request = AuthRequest::signed(&self.appid, &self.key, now);

        let response = self
            .client
            .post(self.url("auth/"))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let contents = response.text().await?;

        if let Err(e) = classify_status(status, &contents) {
            // Any client-side rejection from the auth endpoint means bad credentials.
            return Err(match e {
                IopgpsError::Api(message) => IopgpsError::Auth(message),
                other => other,
            });
        }

        let auth_response: AuthResponse = serde_json::from_str(&contents).map_err(|e| {
            IopgpsError::Deserialize(format!("{}. Body was: \"{}\"", e, contents))
        })?;
        let token = AuthToken::from_response(&auth_response, now)?;

        *self.token.write().await = Some(token.clone());
        debug!("Obtained IOPGPS token for {}, valid until {}", self.appid, token.expires_at);
        Ok(token)
    }

    async fn ensure_valid_token(&self) -> Result<AuthToken> {
        {
            let lock = self.token.read().await;
            if let Some(ref token) = *lock
                && !token.is_expired()
            {
                return Ok(token.clone());
            }
        }

        debug!("Refreshing IOPGPS token for {}", self.appid);
        match self.obtain_token().await {
            Ok(token) => Ok(token),
            Err(e) => {
                error!("Failed to refresh IOPGPS token for {}: {}", self.appid, e);
                Err(e)
            }
        }
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    async fn list_devices(&self) -> Result<DevicesResponse> {
        self.authorized_get("device", &[]).await
    }

    async fn get_device_detail(&self, imei: &str) -> Result<DeviceDetailResponse> {
        self.authorized_get("device/detail/", &[("imei", imei)])
            .await
            .map_err(|e| e.for_device(imei))
    }

    async fn get_location(&self, imei: &str) -> Result<Location> {
        self.authorized_get("device/location", &[("imei", imei)])
            .await
            .map_err(|e| e.for_device(imei))
    }
}

pub trait IopgpsApiTrait {
    /// Exchanges the account credentials for a fresh token and caches it.
    fn obtain_token(&self) -> impl Future<Output = Result<AuthToken>> + Send;
    /// Returns the cached token, obtaining a new one when missing or expired.
    fn ensure_valid_token(&self) -> impl Future<Output = Result<AuthToken>> + Send;
    fn invalidate_token(&self) -> impl Future<Output = ()> + Send;
    fn list_devices(&self) -> impl Future<Output = Result<DevicesResponse>> + Send;
    fn get_device_detail(
        &self,
        imei: &str,
    ) -> impl Future<Output = Result<DeviceDetailResponse>> + Send;
    fn get_location(&self, imei: &str) -> impl Future<Output = Result<Location>> + Send;
}

impl<T> IopgpsApiTrait for Arc<T>
where
    T: IopgpsApiTrait + Send + Sync,
{
    async fn obtain_token(&self) -> Result<AuthToken> {
        self.as_ref().obtain_token().await
    }

    async fn ensure_valid_token(&self) -> Result<AuthToken> {
        self.as_ref().ensure_valid_token().await
    }

    async fn invalidate_token(&self) {
        self.as_ref().invalidate_token().await
    }

    async fn list_devices(&self) -> Result<DevicesResponse> {
        self.as_ref().list_devices().await
    }

    async fn get_device_detail(&self, imei: &str) -> Result<DeviceDetailResponse> {
        self.as_ref().get_device_detail(imei).await
    }

    async fn get_location(&self, imei: &str) -> Result<Location> {
        self.as_ref().get_location(imei).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(classify_status(StatusCode::OK, "").is_ok());
        assert!(
            classify_status(StatusCode::UNAUTHORIZED, r#"{"error":"expired"}"#)
                .unwrap_err()
                .is_auth()
        );
        assert!(
            classify_status(StatusCode::BAD_GATEWAY, "")
                .unwrap_err()
                .is_transient()
        );
        match classify_status(StatusCode::BAD_REQUEST, r#"{"error":"no such imei"}"#) {
            Err(IopgpsError::Api(message)) => assert_eq!(message, "no such imei"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client =
            IopgpsClient::new("http://localhost:1234/api", "app", "key", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.url("device"), "http://localhost:1234/api/device");
    }
}
