// commands/mod.rs
use async_trait::async_trait;

use crate::color::Hsv;
use crate::config::BrightnessSource;
use crate::devices::{DeviceHandle, DeviceKind, DeviceStatus, DriverError};
use crate::models::Action;

/// A single step against one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    PowerOn,
    PowerOff,
    /// Read power state, then issue the opposite call. Not atomic with respect
    /// to changes made outside this gateway between the two calls.
    Toggle,
    SetBrightness(u8),
    SetHueSaturation { hue: f64, saturation: f64 },
}

impl Operation {
    pub fn power(on: bool) -> Self {
        if on { Operation::PowerOn } else { Operation::PowerOff }
    }

    pub async fn apply(self, device: &mut dyn DeviceHandle) -> Result<(), DriverError> {
        match self {
            Operation::PowerOn => device.on().await,
            Operation::PowerOff => device.off().await,
            Operation::Toggle => {
                let status = device.get_status().await?;
                if status.is_on {
                    device.off().await
                } else {
                    device.on().await
                }
            }
            Operation::SetBrightness(level) => device.set_brightness(level).await,
            Operation::SetHueSaturation { hue, saturation } => {
                device.set_hue_saturation(hue, saturation).await
            }
        }
    }
}

impl From<Action> for Operation {
    fn from(action: Action) -> Self {
        match action {
            Action::On => Operation::PowerOn,
            Action::Off => Operation::PowerOff,
            Action::Toggle => Operation::Toggle,
        }
    }
}

/// Work performed against each targeted device during a fan-out.
#[async_trait]
pub trait DeviceCommand: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Label used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        kind: DeviceKind,
        device: &mut dyn DeviceHandle,
    ) -> Result<Self::Output, DriverError>;
}

pub struct Control {
    action: Action,
}

impl Control {
    pub fn new(action: Action) -> Self {
        Self { action }
    }
}

#[async_trait]
impl DeviceCommand for Control {
    type Output = String;

    fn name(&self) -> &'static str {
        "control"
    }

    async fn execute(
        &self,
        _kind: DeviceKind,
        device: &mut dyn DeviceHandle,
    ) -> Result<String, DriverError> {
        Operation::from(self.action).apply(device).await?;
        Ok(format!("{} successful", self.action))
    }
}

/// Power, brightness and optionally hue/saturation, applied in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct SetProperties {
    level: u8,
    color: Option<Hsv>,
}

impl SetProperties {
    /// Build the per-device plan. `None` when the request carries nothing to apply.
    ///
    /// With a colour, the applied level comes from `source`: the colour's value
    /// channel, or the explicit `brightness` when configured and present.
    pub fn plan(
        brightness: Option<u8>,
        color: Option<Hsv>,
        source: BrightnessSource,
    ) -> Option<Self> {
        let level = match (color, source) {
            (Some(hsv), BrightnessSource::ColorValue) => hsv.level(),
            (Some(hsv), BrightnessSource::Explicit) => brightness.unwrap_or_else(|| hsv.level()),
            (None, _) => brightness?,
        };
        Some(Self { level, color })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Plugs only take the power step.
    pub fn steps(&self, kind: DeviceKind) -> Vec<Operation> {
        let mut steps = vec![Operation::power(self.level > 0)];
        if kind.supports_color() {
            steps.push(Operation::SetBrightness(self.level));
            if let Some(hsv) = self.color {
                steps.push(Operation::SetHueSaturation {
                    hue: hsv.hue,
                    saturation: hsv.saturation,
                });
            }
        }
        steps
    }
}

#[async_trait]
impl DeviceCommand for SetProperties {
    type Output = String;

    fn name(&self) -> &'static str {
        "set_properties"
    }

    async fn execute(
        &self,
        kind: DeviceKind,
        device: &mut dyn DeviceHandle,
    ) -> Result<String, DriverError> {
        for step in self.steps(kind) {
            step.apply(device).await?;
        }

        Ok(match self.color {
            Some(_) => "Properties set successfully".to_string(),
            None => "Brightness set successfully".to_string(),
        })
    }
}

pub struct QueryStatus;

#[async_trait]
impl DeviceCommand for QueryStatus {
    type Output = DeviceStatus;

    fn name(&self) -> &'static str {
        "get_info"
    }

    async fn execute(
        &self,
        _kind: DeviceKind,
        device: &mut dyn DeviceHandle,
    ) -> Result<DeviceStatus, DriverError> {
        device.get_status().await
    }
}
