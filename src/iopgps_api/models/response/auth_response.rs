use crate::iopgps_api::models::response::api_status::ApiStatus;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
    #[serde(rename = "expiresIn", default)]
    pub expires_in: Option<i64>,
}
