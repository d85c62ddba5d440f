// devices/mod.rs
#[doc(hidden)]
pub mod mock;
pub mod tapo;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Capability class of a configured device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Switchable plug: on/off only.
    Plug,
    /// Dimmable colour light: on/off, brightness and hue/saturation.
    Light,
}

impl DeviceKind {
    pub fn supports_color(self) -> bool {
        matches!(self, DeviceKind::Light)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Plug => f.write_str("plug"),
            DeviceKind::Light => f.write_str("light"),
        }
    }
}

/// Power/colour state reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceStatus {
    pub is_on: bool,
    pub hue: Option<u16>,
    pub brightness: Option<u8>,
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Failed to connect to {address}: {message}")]
    Connection { address: String, message: String },
    #[error("{0}")]
    Operation(String),
    #[error("Operation not supported by {0} devices")]
    Unsupported(DeviceKind),
}

impl DriverError {
    pub fn operation(err: impl fmt::Display) -> Self {
        DriverError::Operation(err.to_string())
    }
}

/// Opens sessions with physical devices.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    async fn connect(
        &self,
        kind: DeviceKind,
        address: &str,
    ) -> Result<Box<dyn DeviceHandle>, DriverError>;
}

/// An open session with one device. Every call may suspend on network I/O.
#[async_trait]
pub trait DeviceHandle: Send {
    async fn on(&mut self) -> Result<(), DriverError>;
    async fn off(&mut self) -> Result<(), DriverError>;
    async fn get_status(&mut self) -> Result<DeviceStatus, DriverError>;
    /// `level` is a percentage in `0..=100`.
    async fn set_brightness(&mut self, level: u8) -> Result<(), DriverError>;
    /// `hue` and `saturation` are normalised to `[0, 1]`.
    async fn set_hue_saturation(&mut self, hue: f64, saturation: f64) -> Result<(), DriverError>;

    /// Tear down driver-side session state. Stateless sessions have none.
    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}
