use crate::home_assistant::topics::DEFAULT_DISCOVERY_PREFIX;
use crate::iopgps_api::iopgps_client::DEFAULT_API_URL;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub iopgps: IopgpsConfig,
    pub home_assistant: HomeAssistantConfig,
    pub intervals: IntervalConfig,
    pub limits: LimitsConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub directory: String,
    pub debug_file: String,
    pub info_file: String,
    pub warn_file: String,
    pub error_file: String,
    pub console_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IopgpsConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub request_timeout_seconds: u64,
}

/// One IOPGPS account. `user` is the vendor appid, `key` the API key.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AccountConfig {
    /// Stable id used in entity unique ids; generated on first start when empty.
    #[serde(default)]
    pub guid: String,
    pub entry_name: String,
    pub user: String,
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HomeAssistantConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: String,
    pub mqtt_password: String,
    pub client_id: String,
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IntervalConfig {
    pub scan_interval_seconds: u64,
    pub discovery_interval_seconds: u64,
    pub battery_cache_seconds: u64,
    pub reconnect_delay_seconds: u64,
    pub mqtt_keep_alive_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitsConfig {
    pub mqtt_queue_size: usize,
}

/// Reasons a config file is rejected at startup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("entry_name_required (account #{0})")]
    EntryNameRequired(usize),
    #[error("user_required (account \"{0}\")")]
    UserRequired(String),
    #[error("key_required (account \"{0}\")")]
    KeyRequired(String),
    #[error("duplicate account guid {0}")]
    DuplicateGuid(String),
    #[error("no accounts configured")]
    NoAccounts,
    #[error(
        "scan_interval_seconds ({scan}) must exceed three request timeouts ({timeout}s each)"
    )]
    ScanIntervalTooShort { scan: u64, timeout: u64 },
    #[error("no config file found, wrote an example to {0}")]
    ExampleCreated(String),
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_discovery_prefix() -> String {
    DEFAULT_DISCOVERY_PREFIX.to_string()
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the config, writing the example template only when the file does not exist.
    ///
    /// Any other failure, a parse error included, is returned and the file is left alone.
    /// A freshly written example is reported as [`ConfigError::ExampleCreated`].
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Err(e)
                if e.root_cause()
                    .downcast_ref::<io::Error>()
                    .is_some_and(|io| io.kind() == io::ErrorKind::NotFound) =>
            {
                Self::save_example(path)?;
                Err(ConfigError::ExampleCreated(path.display().to_string()).into())
            }
            other => other,
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        fs::write(path, toml_content)?;
        Ok(())
    }

    /// Gives every account without a guid a fresh one. Returns true if any changed.
    pub fn assign_missing_guids(&mut self) -> bool {
        let mut changed = false;
        for account in self.accounts.iter_mut() {
            if account.guid.trim().is_empty() {
                account.guid = Uuid::new_v4().to_string();
                changed = true;
            }
        }
        changed
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::NoAccounts);
        }
        // every update makes up to three sequential requests per device
        if self.intervals.scan_interval_seconds <= self.iopgps.request_timeout_seconds * 3 {
            return Err(ConfigError::ScanIntervalTooShort {
                scan: self.intervals.scan_interval_seconds,
                timeout: self.iopgps.request_timeout_seconds,
            });
        }

        let mut guids = HashSet::new();
        for (index, account) in self.accounts.iter().enumerate() {
            if account.entry_name.trim().is_empty() {
                return Err(ConfigError::EntryNameRequired(index + 1));
            }
            if account.user.trim().is_empty() {
                return Err(ConfigError::UserRequired(account.entry_name.clone()));
            }
            if account.key.trim().is_empty() {
                return Err(ConfigError::KeyRequired(account.entry_name.clone()));
            }
            if !account.guid.is_empty() && !guids.insert(account.guid.clone()) {
                return Err(ConfigError::DuplicateGuid(account.guid.clone()));
            }
        }
        Ok(())
    }

    pub fn example() -> Self {
        Config {
            logging: LoggingConfig {
                directory: "./logs".to_string(),
                debug_file: "log_debug.log".to_string(),
                info_file: "log_info.log".to_string(),
                warn_file: "log_warn.log".to_string(),
                error_file: "log_error.log".to_string(),
                console_level: "info".to_string(),
            },
            iopgps: IopgpsConfig {
                api_url: DEFAULT_API_URL.to_string(),
                request_timeout_seconds: 5,
            },
            home_assistant: HomeAssistantConfig {
                mqtt_host: "192.168.1.40".to_string(),
                mqtt_port: 1883,
                mqtt_username: "homeassistant".to_string(),
                mqtt_password: "REPLACE_WITH_YOUR_HOMEASSISTANT_MQTT_PASSWORD".to_string(),
                client_id: "iopgps-bridge".to_string(),
                discovery_prefix: DEFAULT_DISCOVERY_PREFIX.to_string(),
            },
            intervals: IntervalConfig {
                scan_interval_seconds: 30,
                discovery_interval_seconds: 300,
                battery_cache_seconds: 120,
                reconnect_delay_seconds: 30,
                mqtt_keep_alive_seconds: 30,
            },
            limits: LimitsConfig {
                mqtt_queue_size: 100,
            },
            accounts: vec![AccountConfig {
                guid: String::new(),
                entry_name: "My IOPGPS account".to_string(),
                user: "REPLACE_WITH_YOUR_IOPGPS_APPID".to_string(),
                key: "REPLACE_WITH_YOUR_IOPGPS_KEY".to_string(),
            }],
        }
    }

    pub fn save_example<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::example().save(path)
    }
}
