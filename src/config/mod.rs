// config/mod.rs
use std::collections::HashSet;
use std::env;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::devices::DeviceKind;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub metrics: MetricsSettings,
    pub credentials: CredentialSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub devices: Vec<DeviceSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Clone, Deserialize)]
pub struct CredentialSettings {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Per-device deadline. Unset means a device call may wait indefinitely.
    pub timeout_ms: Option<u64>,
    pub brightness_source: BrightnessSource,
}

impl DispatchSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Where `set_properties` takes the applied brightness from when a colour is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessSource {
    /// Value channel of the converted colour; the request's `brightness` is ignored.
    #[default]
    ColorValue,
    /// The request's `brightness` field, falling back to the value channel when absent.
    Explicit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    pub name: String,
    pub kind: DeviceKind,
    pub address: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name("config/config").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("credentials.username", env::var("TAPO_USERNAME").ok())?
            .set_override_option("credentials.password", env::var("TAPO_PASSWORD").ok())?
            .set_override_option(
                "server.address",
                env::var("PORT").ok().map(|port| format!("0.0.0.0:{port}")),
            )?;

        Self::finish(builder)
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::finish(Self::defaults()?.add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.address", "0.0.0.0:8080")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.port", 9000_i64)?
            .set_default("credentials.username", "")?
            .set_default("credentials.password", "")
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate device name: {}",
                    device.name
                )));
            }
        }
        Ok(())
    }
}
