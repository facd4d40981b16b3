//! Configuration System
//!
//! Layered configuration for the registry: built-in defaults, an optional user
//! config file, an explicit file, then `BEACON_*` environment overrides.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::session::{DEFAULT_MESSAGE, DEFAULT_TITLE};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const ENV_PREFIX: &str = "BEACON";
const DEFAULT_NOTIFICATION_MS: u64 = 3000;
const DEFAULT_ID_PREFIX: &str = "progress";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Fallback text for sessions shown without a title or message
    #[serde(default)]
    pub defaults: SessionDefaults,

    /// Timed notification settings
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Prefix for generated session ids
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDefaults {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_message")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// How long a notification stays visible, in milliseconds
    #[serde(default = "default_notification_ms")]
    pub duration_ms: u64,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

fn default_notification_ms() -> u64 {
    DEFAULT_NOTIFICATION_MS
}

fn default_id_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            title: default_title(),
            message: default_message(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_notification_ms(),
        }
    }
}

impl NotificationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            defaults: SessionDefaults::default(),
            notification: NotificationConfig::default(),
            id_prefix: default_id_prefix(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Defaults(String),
    Notification(String),
    IdPrefix(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Defaults(msg) => write!(f, "Defaults: {}", msg),
            ValidationError::Notification(msg) => write!(f, "Notification: {}", msg),
            ValidationError::IdPrefix(msg) => write!(f, "Id prefix: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BeaconConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.defaults.title.trim().is_empty() {
            errors.push(ValidationError::Defaults(
                "default title cannot be empty".to_string(),
            ));
        }
        if self.notification.duration_ms == 0 {
            errors.push(ValidationError::Notification(
                "duration_ms must be greater than zero".to_string(),
            ));
        }
        if self.id_prefix.trim().is_empty() {
            errors.push(ValidationError::IdPrefix(
                "id prefix cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Loads [`BeaconConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, with `explicit` taking precedence over the user file.
    ///
    /// Environment variables (`BEACON_NOTIFICATION__DURATION_MS=500`) override both.
    pub fn load(explicit: Option<&Path>) -> Result<BeaconConfig, ApiError> {
        let mut builder = builder_with_defaults()?;

        if let Some(user_path) = user_config_path() {
            if user_path.exists() {
                debug!(config_path = %user_path.display(), "loading user config");
                builder = builder.add_source(File::from(user_path).required(false));
            }
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        finish(builder)
    }

    /// Load a single file on top of the defaults, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<BeaconConfig, ApiError> {
        let builder =
            builder_with_defaults()?.add_source(File::from(path.to_path_buf()).required(true));
        finish(builder)
    }
}

/// `$XDG_CONFIG_HOME/beacon/config.toml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "beacon").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("defaults.title", DEFAULT_TITLE)?
        .set_default("defaults.message", DEFAULT_MESSAGE)?
        .set_default("notification.duration_ms", DEFAULT_NOTIFICATION_MS as i64)?
        .set_default("id_prefix", DEFAULT_ID_PREFIX)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<BeaconConfig, ApiError> {
    let config: BeaconConfig = builder.build()?.try_deserialize()?;
    config.validate().map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ApiError::ConfigError(format!(
            "Configuration validation failed:\n{}",
            error_msgs.join("\n")
        ))
    })?;
    Ok(config)
}
