// tapo.rs
use async_trait::async_trait;
use tapo::{ApiClient, ColorLightHandler, PlugHandler};

use super::{DeviceDriver, DeviceHandle, DeviceKind, DeviceStatus, DriverError};

/// Driver backed by the Tapo cloud-less local API: P100 for plugs, L530 for lights.
pub struct TapoDriver {
    client: ApiClient,
}

impl TapoDriver {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            client: ApiClient::new(username, password),
        }
    }
}

#[async_trait]
impl DeviceDriver for TapoDriver {
    async fn connect(
        &self,
        kind: DeviceKind,
        address: &str,
    ) -> Result<Box<dyn DeviceHandle>, DriverError> {
        let client = self.client.clone();
        let handle = match kind {
            DeviceKind::Plug => client.p100(address).await.map(TapoHandle::Plug),
            DeviceKind::Light => client.l530(address).await.map(TapoHandle::Light),
        };

        handle
            .map(|handle| Box::new(handle) as Box<dyn DeviceHandle>)
            .map_err(|e| DriverError::Connection {
                address: address.to_string(),
                message: e.to_string(),
            })
    }
}

pub enum TapoHandle {
    Plug(PlugHandler),
    Light(ColorLightHandler),
}

#[async_trait]
impl DeviceHandle for TapoHandle {
    async fn on(&mut self) -> Result<(), DriverError> {
        let result = match self {
            TapoHandle::Plug(plug) => plug.on().await,
            TapoHandle::Light(light) => light.on().await,
        };
        result.map_err(DriverError::operation)
    }

    async fn off(&mut self) -> Result<(), DriverError> {
        let result = match self {
            TapoHandle::Plug(plug) => plug.off().await,
            TapoHandle::Light(light) => light.off().await,
        };
        result.map_err(DriverError::operation)
    }

    async fn get_status(&mut self) -> Result<DeviceStatus, DriverError> {
        match self {
            TapoHandle::Plug(plug) => {
                let info = plug.get_device_info().await.map_err(DriverError::operation)?;
                Ok(DeviceStatus {
                    is_on: info.device_on,
                    hue: None,
                    brightness: None,
                })
            }
            TapoHandle::Light(light) => {
                let info = light.get_device_info().await.map_err(DriverError::operation)?;
                Ok(DeviceStatus {
                    is_on: info.device_on,
                    hue: info.hue,
                    brightness: Some(info.brightness),
                })
            }
        }
    }

    async fn set_brightness(&mut self, level: u8) -> Result<(), DriverError> {
        match self {
            TapoHandle::Plug(_) => Err(DriverError::Unsupported(DeviceKind::Plug)),
            TapoHandle::Light(light) => match device_brightness(level) {
                Some(level) => light
                    .set_brightness(level)
                    .await
                    .map_err(DriverError::operation),
                None => Ok(()),
            },
        }
    }

    async fn set_hue_saturation(&mut self, hue: f64, saturation: f64) -> Result<(), DriverError> {
        match self {
            TapoHandle::Plug(_) => Err(DriverError::Unsupported(DeviceKind::Plug)),
            TapoHandle::Light(light) => {
                let result = match device_color(hue, saturation) {
                    LightColor::HueSaturation { hue, saturation } => {
                        light.set_hue_saturation(hue, saturation).await
                    }
                    LightColor::White => light.set_color_temperature(WHITE_TEMPERATURE).await,
                };
                result.map_err(DriverError::operation)
            }
        }
    }
}

/// D65, the sRGB white point.
const WHITE_TEMPERATURE: u16 = 6500;

#[derive(Debug, Clone, Copy, PartialEq)]
enum LightColor {
    /// Degrees in `0..360`, percent in `1..=100`.
    HueSaturation { hue: u16, saturation: u8 },
    White,
}

/// The L530 rejects brightness 0; the power step already covers it.
fn device_brightness(level: u8) -> Option<u8> {
    (level > 0).then(|| level.min(100))
}

/// Scale normalised hue/saturation to the units the L530 accepts. The device
/// rejects saturation 0, so greys become a white colour temperature.
fn device_color(hue: f64, saturation: f64) -> LightColor {
    if saturation <= 0.0 {
        return LightColor::White;
    }
    LightColor::HueSaturation {
        hue: ((hue * 360.0).round() as u16) % 360,
        saturation: (saturation * 100.0).round().clamp(1.0, 100.0) as u8,
    }
}
