use serde::{Deserialize, Serialize};

/// Status fields the IOPGPS API attaches to every response body.
/// A missing or zero `code` means success.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl ApiStatus {
    /// Returns the vendor error message, if the body reports one.
    pub fn error_message(&self) -> Option<String> {
        if let Some(error) = &self.error
            && !error.is_null()
        {
            return Some(match error {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        match self.code {
            Some(code) if code != 0 => Some(format!(
                "code {}: {}",
                code,
                self.result.as_deref().unwrap_or("no message")
            )),
            _ => None,
        }
    }
}
