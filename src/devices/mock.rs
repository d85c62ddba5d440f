//! In-memory driver for unit and integration tests.
//!
//! Always compiled, hidden from public docs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{DeviceDriver, DeviceHandle, DeviceKind, DeviceStatus, DriverError};

/// A driver call as recorded by [`MockDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    On,
    Off,
    GetStatus,
    SetBrightness(u8),
    SetHueSaturation(f64, f64),
}

/// Simulated device state shared between the test and every handle opened on it.
pub struct MockDevice {
    /// Recorded driver calls, in order.
    pub calls: Mutex<Vec<Call>>,
    pub status: Mutex<DeviceStatus>,
    /// If true, every call after connect fails.
    pub fail_calls: AtomicBool,
    /// If true, `connect` fails for this device.
    pub fail_connect: AtomicBool,
    /// Artificial latency applied to every call.
    pub delay: Mutex<Option<Duration>>,
    pub connects: AtomicUsize,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    pub fn new() -> Self {
        MockDevice {
            calls: Mutex::new(Vec::new()),
            status: Mutex::new(DeviceStatus {
                is_on: false,
                hue: Some(0),
                brightness: Some(100),
            }),
            fail_calls: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            delay: Mutex::new(None),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn powered(is_on: bool) -> Arc<Self> {
        let device = Self::new();
        lock(&device.status).is_on = is_on;
        Arc::new(device)
    }

    pub fn failing() -> Arc<Self> {
        let device = Self::new();
        device.fail_calls.store(true, Ordering::SeqCst);
        Arc::new(device)
    }

    pub fn unreachable() -> Arc<Self> {
        let device = Self::new();
        device.fail_connect.store(true, Ordering::SeqCst);
        Arc::new(device)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        let device = Self::new();
        *lock(&device.delay) = Some(delay);
        Arc::new(device)
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        lock(&self.calls).iter().filter(|c| *c == call).count()
    }

    pub fn is_on(&self) -> bool {
        lock(&self.status).is_on
    }
}

/// Driver resolving addresses to pre-registered [`MockDevice`]s.
#[derive(Default)]
pub struct MockDriver {
    devices: HashMap<String, Arc<MockDevice>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, address: &str, device: Arc<MockDevice>) -> Self {
        self.devices.insert(address.to_string(), device);
        self
    }
}

#[async_trait]
impl DeviceDriver for MockDriver {
    async fn connect(
        &self,
        kind: DeviceKind,
        address: &str,
    ) -> Result<Box<dyn DeviceHandle>, DriverError> {
        let unreachable = || DriverError::Connection {
            address: address.to_string(),
            message: "mock: host unreachable".into(),
        };

        let device = self.devices.get(address).ok_or_else(&unreachable)?;
        device.connects.fetch_add(1, Ordering::SeqCst);
        if device.fail_connect.load(Ordering::SeqCst) {
            return Err(unreachable());
        }

        Ok(Box::new(MockHandle {
            kind,
            device: Arc::clone(device),
        }))
    }
}

pub struct MockHandle {
    kind: DeviceKind,
    device: Arc<MockDevice>,
}

impl MockHandle {
    async fn record(&self, call: Call) -> Result<(), DriverError> {
        let delay = *lock(&self.device.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        lock(&self.device.calls).push(call);
        if self.device.fail_calls.load(Ordering::SeqCst) {
            return Err(DriverError::Operation("mock: injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceHandle for MockHandle {
    async fn on(&mut self) -> Result<(), DriverError> {
        self.record(Call::On).await?;
        lock(&self.device.status).is_on = true;
        Ok(())
    }

    async fn off(&mut self) -> Result<(), DriverError> {
        self.record(Call::Off).await?;
        lock(&self.device.status).is_on = false;
        Ok(())
    }

    async fn get_status(&mut self) -> Result<DeviceStatus, DriverError> {
        self.record(Call::GetStatus).await?;
        let status = lock(&self.device.status).clone();
        Ok(match self.kind {
            DeviceKind::Plug => DeviceStatus {
                is_on: status.is_on,
                hue: None,
                brightness: None,
            },
            DeviceKind::Light => status,
        })
    }

    async fn set_brightness(&mut self, level: u8) -> Result<(), DriverError> {
        if self.kind == DeviceKind::Plug {
            return Err(DriverError::Unsupported(DeviceKind::Plug));
        }
        self.record(Call::SetBrightness(level)).await?;
        lock(&self.device.status).brightness = Some(level);
        Ok(())
    }

    async fn set_hue_saturation(&mut self, hue: f64, saturation: f64) -> Result<(), DriverError> {
        if self.kind == DeviceKind::Plug {
            return Err(DriverError::Unsupported(DeviceKind::Plug));
        }
        self.record(Call::SetHueSaturation(hue, saturation)).await?;
        lock(&self.device.status).hue = Some((hue * 360.0).round() as u16);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
