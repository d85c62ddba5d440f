use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::config::DispatchSettings;
use crate::devices::DeviceStatus;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    On,
    Off,
    Toggle,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::On => f.write_str("on"),
            Action::Off => f.write_str("off"),
            Action::Toggle => f.write_str("toggle"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ControlRequest {
    pub action: Action,
    /// Target devices; every registered device when omitted.
    pub lights: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetPropertiesRequest {
    #[validate(range(min = 0, max = 100))]
    pub brightness: Option<i64>,
    /// `[r, g, b]`, each channel an integer in `0..=255`. Parsed as plain
    /// numbers so every malformed channel gets the same 400 body.
    pub color: Option<Vec<f64>>,
    pub lights: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InfoQuery {
    /// Repeat to select several devices; every registered device when omitted.
    #[serde(default)]
    pub lights: Vec<String>,
}

/// Per-device entry of a `get_info` response.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DeviceInfo {
    Status(DeviceStatus),
    Error { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub devices: usize,
    pub connected: usize,
}

pub struct AppState {
    pub registry: Arc<Registry>,
    pub dispatch: DispatchSettings,
}

impl AppState {
    pub fn new(registry: Registry, dispatch: DispatchSettings) -> Self {
        Self {
            registry: Arc::new(registry),
            dispatch,
        }
    }

    /// Requested names, or every registered name when the field was omitted.
    pub fn targets(&self, requested: Option<Vec<String>>) -> Vec<String> {
        requested.unwrap_or_else(|| self.registry.names())
    }
}
