use crate::error::{IopgpsError, Result};
use crate::iopgps_api::models::response::auth_response::AuthResponse;
use chrono::Utc;

/// Seconds before the real expiry at which a token is treated as expired.
pub const EXPIRY_BUFFER_SECONDS: i64 = 30;

/// Access token used in the `accessToken` header of every data call.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub token: String,
    /// Unix timestamp (seconds) after which the token must not be used.
    pub expires_at: i64,
}

impl AuthToken {
    /// Builds a token from an auth response received at `now`.
    ///
    /// `expiresIn` is read as epoch milliseconds, epoch seconds or a lifetime in
    /// seconds, depending on its magnitude.
    pub fn from_response(response: &AuthResponse, now: i64) -> Result<Self> {
        if let Some(message) = response.status.error_message() {
            return Err(IopgpsError::Auth(message));
        }
        let token = match &response.access_token {
            Some(token) if !token.is_empty() => token.clone(),
            _ => {
                return Err(IopgpsError::Auth(
                    "auth response did not contain an access token".to_string(),
                ));
            }
        };
        let expires_in = response.expires_in.unwrap_or(0);
        let expires_at = if expires_in >= 1_000_000_000_000 {
            expires_in / 1000
        } else if expires_in >= 1_000_000_000 {
            expires_in
        } else {
            now + expires_in.max(0)
        };
        Ok(Self { token, expires_at })
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now + EXPIRY_BUFFER_SECONDS >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}
