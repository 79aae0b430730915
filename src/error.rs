//! Error types for the IOPGPS API and tracker layers.

/// Errors raised while talking to the IOPGPS API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IopgpsError {
    /// Credentials or token rejected by the vendor.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connectivity failure or timeout; retried on the next tick.
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// A single tracker could not be read.
    #[error("Device {imei} unavailable: {reason}")]
    DeviceUnavailable { imei: String, reason: String },

    /// The API answered but reported an error.
    #[error("IOPGPS API error: {0}")]
    Api(String),

    #[error("Unable to deserialize response: {0}")]
    Deserialize(String),
}

impl IopgpsError {
    pub fn is_auth(&self) -> bool {
        matches!(self, IopgpsError::Auth(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, IopgpsError::TransientNetwork(_))
    }

    pub fn is_device(&self) -> bool {
        matches!(self, IopgpsError::DeviceUnavailable { .. })
    }

    /// Re-tags an API or decode failure on a per-device endpoint.
    /// Auth and network failures keep their kind.
    pub fn for_device(self, imei: &str) -> Self {
        match self {
            IopgpsError::Auth(_)
            | IopgpsError::TransientNetwork(_)
            | IopgpsError::DeviceUnavailable { .. } => self,
            other => IopgpsError::DeviceUnavailable {
                imei: imei.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for IopgpsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            IopgpsError::TransientNetwork(e.to_string())
        } else if e.is_decode() {
            IopgpsError::Deserialize(e.to_string())
        } else {
            IopgpsError::Api(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, IopgpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(IopgpsError::Auth("bad".into()).is_auth());
        assert!(IopgpsError::TransientNetwork("timeout".into()).is_transient());
        assert!(!IopgpsError::Api("x".into()).is_transient());
    }

    #[test]
    fn for_device_keeps_auth_errors() {
        let e = IopgpsError::Auth("expired".into()).for_device("123");
        assert!(e.is_auth());

        let e = IopgpsError::TransientNetwork("reset".into()).for_device("123");
        assert!(e.is_transient());

        let e = IopgpsError::Api("device offline".into()).for_device("123");
        match e {
            IopgpsError::DeviceUnavailable { imei, reason } => {
                assert_eq!(imei, "123");
                assert!(reason.contains("device offline"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
