//! Application configuration
//!
//! Built once at startup, from JSON or a JS object, and handed to
//! [`AppContext`](crate::AppContext).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use signature_pad::{ResizePolicy, SessionOptions};

use crate::error::ConfigError;

fn default_settle_delay_ms() -> u32 {
    100
}

fn default_load_delay_ms() -> u32 {
    500
}

fn default_access_token_storage_key() -> String {
    "fieldforms.access_token".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the document store, e.g. `https://project.example.co`
    pub store_url: String,
    /// Public API key sent with every store request
    pub anon_key: String,
    /// Recipient prefilled in the mail hand-off; may be empty
    #[serde(default)]
    pub mail_recipient: String,
    #[serde(default)]
    pub resize_policy: ResizePolicy,
    /// Delay before a pad sizes itself to its container
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u32,
    /// Minimum wait before a `?id=` document is loaded
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u32,
    /// Local storage key holding the signed-in user's access token
    #[serde(default = "default_access_token_storage_key")]
    pub access_token_storage_key: String,
}

impl AppConfig {
    pub fn new(store_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            store_url: store_url.into(),
            anon_key: anon_key.into(),
            mail_recipient: String::new(),
            resize_policy: ResizePolicy::default(),
            settle_delay_ms: default_settle_delay_ms(),
            load_delay_ms: default_load_delay_ms(),
            access_token_storage_key: default_access_token_storage_key(),
        }
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.store_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingStoreUrl);
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidStoreUrl(url.to_string()));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::MissingAnonKey);
        }
        Ok(())
    }

    /// Store URL without trailing slashes
    pub fn store_base(&self) -> &str {
        self.store_url.trim().trim_end_matches('/')
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            resize_policy: self.resize_policy,
            ..SessionOptions::default()
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.settle_delay_ms))
    }

    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.load_delay_ms))
    }
}
