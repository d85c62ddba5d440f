// registry.rs
use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::config::DeviceSettings;
use crate::devices::{DeviceDriver, DeviceHandle, DeviceKind, DriverError};

pub type HandleGuard<'a> = MutexGuard<'a, Box<dyn DeviceHandle>>;

/// One configured device and, if its startup connect succeeded, its session.
pub struct RegistryEntry {
    name: String,
    kind: DeviceKind,
    address: String,
    // One guard per device: overlapping requests on the same device serialize.
    handle: Option<Mutex<Box<dyn DeviceHandle>>>,
    connection_error: Option<String>,
}

impl RegistryEntry {
    fn new(device: &DeviceSettings, outcome: Result<Box<dyn DeviceHandle>, DriverError>) -> Self {
        let (handle, connection_error) = match outcome {
            Ok(handle) => (Some(Mutex::new(handle)), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            name: device.name.clone(),
            kind: device.kind,
            address: device.address.clone(),
            handle,
            connection_error,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn connection_error(&self) -> Option<&str> {
        self.connection_error.as_deref()
    }

    /// Exclusive access to the device session, waiting for any in-flight request on it.
    pub async fn lock(&self) -> Option<HandleGuard<'_>> {
        match &self.handle {
            Some(handle) => Some(handle.lock().await),
            None => None,
        }
    }
}

/// Device name to connection state, fixed once built.
pub struct Registry {
    entries: HashMap<String, Arc<RegistryEntry>>,
    order: Vec<String>,
}

impl Registry {
    /// Connect to every configured device. Attempts run concurrently and a
    /// failed attempt only marks its own entry as disconnected.
    pub async fn initialize(driver: &dyn DeviceDriver, devices: &[DeviceSettings]) -> Self {
        let attempts = devices.iter().map(|device| async move {
            let outcome = driver.connect(device.kind, &device.address).await;
            match &outcome {
                Ok(_) => info!(
                    "Connected to {} ({}) at {} successfully",
                    device.name, device.kind, device.address
                ),
                Err(e) => error!("Failed to connect to {} at {}: {}", device.name, device.address, e),
            }
            RegistryEntry::new(device, outcome)
        });

        let mut entries = HashMap::new();
        let mut order = Vec::new();
        for entry in join_all(attempts).await {
            order.push(entry.name.clone());
            entries.insert(entry.name.clone(), Arc::new(entry));
        }

        Self { entries, order }
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<RegistryEntry>> {
        self.entries.get(name)
    }

    /// Like [`Registry::lookup`], but only for entries that can receive operations.
    pub fn connected(&self, name: &str) -> Option<&Arc<RegistryEntry>> {
        self.lookup(name).filter(|entry| entry.connected())
    }

    /// Every configured name, in configuration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn connected_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.connected()).count()
    }

    /// Wait for in-flight work on every connected device, then close its
    /// session. Runs after the server has stopped accepting requests.
    pub async fn shutdown(&self) {
        for entry in self.order.iter().filter_map(|name| self.entries.get(name)) {
            if let Some(mut handle) = entry.lock().await {
                match handle.close().await {
                    Ok(()) => info!("{} idle, session released", entry.name()),
                    Err(e) => warn!("Failed to close session for {}: {}", entry.name(), e),
                }
            }
        }
    }
}
