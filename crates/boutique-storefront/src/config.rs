//! Storefront configuration.

use std::path::Path;
use std::time::Duration;

use boutique_commerce::checkout::GatewayCredentials;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorefrontError;

/// Config file names searched for, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["boutique.toml", ".boutique.toml", "boutique.json"];

/// Storefront configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Store metadata.
    #[serde(default)]
    pub store: StoreConfig,

    /// Payment gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// UI timing.
    #[serde(default)]
    pub timing: TimingConfig,
}

impl StorefrontConfig {
    /// Load config from a file. `.json` files are read as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorefrontError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| {
            StorefrontError::ConfigRead {
                path: display.clone(),
                source,
            }
        })?;

        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let config = if is_json {
            serde_json::from_str(&content).map_err(|e| StorefrontError::ConfigParse {
                path: display.clone(),
                message: e.to_string(),
            })?
        } else {
            Self::from_toml_str(&content).map_err(|e| match e {
                StorefrontError::ConfigParse { message, .. } => StorefrontError::ConfigParse {
                    path: display.clone(),
                    message,
                },
                other => other,
            })?
        };

        Ok(config)
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, StorefrontError> {
        toml::from_str(content).map_err(|e| StorefrontError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, StorefrontError> {
        toml::to_string_pretty(self).map_err(|e| StorefrontError::InvalidConfig(e.to_string()))
    }

    /// Check that the values are usable.
    ///
    /// Placeholder credentials are accepted (the sandbox does not care) but
    /// logged.
    pub fn validate(&self) -> Result<(), StorefrontError> {
        if self.gateway.application_id.trim().is_empty() {
            return Err(StorefrontError::InvalidConfig(
                "gateway.application_id must not be empty".to_string(),
            ));
        }
        if self.gateway.location_id.trim().is_empty() {
            return Err(StorefrontError::InvalidConfig(
                "gateway.location_id must not be empty".to_string(),
            ));
        }
        if self.gateway.mount_point.trim().is_empty() {
            return Err(StorefrontError::InvalidConfig(
                "gateway.mount_point must not be empty".to_string(),
            ));
        }

        for (key, value) in [
            ("timing.notification_ms", self.timing.notification_ms),
            ("timing.notification_exit_ms", self.timing.notification_exit_ms),
            ("timing.success_display_ms", self.timing.success_display_ms),
            ("timing.added_feedback_ms", self.timing.added_feedback_ms),
        ] {
            if value == 0 {
                return Err(StorefrontError::InvalidConfig(format!(
                    "{key} must be greater than zero"
                )));
            }
        }

        if self.gateway.has_placeholder_credentials() {
            warn!("gateway credentials are placeholders; only the sandbox will accept them");
        }

        Ok(())
    }
}

/// Store metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Display name.
    #[serde(default = "default_store_name")]
    pub name: String,
}

fn default_store_name() -> String {
    "Jazzy's Boutique".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_store_name(),
        }
    }
}

/// Payment gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Merchant application identifier.
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// Merchant location identifier.
    #[serde(default = "default_location_id")]
    pub location_id: String,

    /// Where the card input is attached.
    #[serde(default = "default_mount_point")]
    pub mount_point: String,

    /// Initialize the gateway at page load instead of on first checkout.
    #[serde(default = "default_true")]
    pub eager_init: bool,
}

fn default_application_id() -> String {
    "sandbox-sq0idb-YOUR_APPLICATION_ID".to_string()
}

fn default_location_id() -> String {
    "YOUR_LOCATION_ID".to_string()
}

fn default_mount_point() -> String {
    "#card-container".to_string()
}

fn default_true() -> bool {
    true
}

impl GatewayConfig {
    /// Credentials for the gateway client.
    pub fn credentials(&self) -> GatewayCredentials {
        GatewayCredentials {
            application_id: self.application_id.clone(),
            location_id: self.location_id.clone(),
        }
    }

    /// Check if either identifier still holds the template placeholder.
    pub fn has_placeholder_credentials(&self) -> bool {
        self.application_id.contains("YOUR_") || self.location_id.contains("YOUR_")
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            application_id: default_application_id(),
            location_id: default_location_id(),
            mount_point: default_mount_point(),
            eager_init: true,
        }
    }
}

/// UI timing in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// How long a notification stays visible.
    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,

    /// Exit animation before a notification is removed.
    #[serde(default = "default_notification_exit_ms")]
    pub notification_exit_ms: u64,

    /// Order processing between a token being issued and the success
    /// message. Zero shows success as soon as the token arrives.
    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,

    /// How long the success message shows before the cart is cleared.
    #[serde(default = "default_success_display_ms")]
    pub success_display_ms: u64,

    /// How long a buy control shows its "added" label.
    #[serde(default = "default_added_feedback_ms")]
    pub added_feedback_ms: u64,
}

fn default_notification_ms() -> u64 {
    3000
}

fn default_notification_exit_ms() -> u64 {
    300
}

fn default_confirm_delay_ms() -> u64 {
    1500
}

fn default_success_display_ms() -> u64 {
    2000
}

fn default_added_feedback_ms() -> u64 {
    2000
}

impl TimingConfig {
    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn notification_exit(&self) -> Duration {
        Duration::from_millis(self.notification_exit_ms)
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }

    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }

    pub fn added_feedback(&self) -> Duration {
        Duration::from_millis(self.added_feedback_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            notification_ms: default_notification_ms(),
            notification_exit_ms: default_notification_exit_ms(),
            confirm_delay_ms: default_confirm_delay_ms(),
            success_display_ms: default_success_display_ms(),
            added_feedback_ms: default_added_feedback_ms(),
        }
    }
}

/// Generate a default boutique.toml.
pub fn generate_default_config(store_name: &str) -> String {
    format!(
        r##"# Storefront configuration

[store]
name = "{store_name}"

[gateway]
# Replace these with your merchant account identifiers
application_id = "sandbox-sq0idb-YOUR_APPLICATION_ID"
location_id = "YOUR_LOCATION_ID"
mount_point = "#card-container"
eager_init = true

[timing]
notification_ms = 3000
notification_exit_ms = 300
confirm_delay_ms = 1500
success_display_ms = 2000
added_feedback_ms = 2000
"##
    )
}
