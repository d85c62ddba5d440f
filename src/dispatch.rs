// dispatch.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::commands::DeviceCommand;
use crate::error::DeviceError;
use crate::registry::{Registry, RegistryEntry};

/// Result of one device's slot in a fan-out.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(DeviceError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Run `command` against every named device concurrently and collect one
/// outcome per distinct name.
///
/// Names without a connected registry entry fail immediately with
/// [`DeviceError::NotFound`] and never reach the driver. Every other device
/// gets its own task; a failure, timeout or panic in one task is recorded in
/// that device's slot and never affects the others. Returns once every task
/// has finished.
pub async fn dispatch<C: DeviceCommand>(
    registry: &Registry,
    names: &[String],
    command: C,
    timeout: Option<Duration>,
) -> HashMap<String, Outcome<C::Output>> {
    let command = Arc::new(command);
    let mut outcomes = HashMap::with_capacity(names.len());
    let mut pending = Vec::new();

    for name in names {
        if outcomes.contains_key(name) || pending.iter().any(|(n, _)| n == name) {
            continue;
        }

        match registry.connected(name) {
            Some(entry) => {
                let entry = Arc::clone(entry);
                let command = Arc::clone(&command);
                let task = tokio::spawn(async move { run(&entry, command.as_ref(), timeout).await });
                pending.push((name.clone(), task));
            }
            None => {
                let outcome = Outcome::Failure(DeviceError::NotFound);
                record(command.name(), name, &outcome);
                outcomes.insert(name.clone(), outcome);
            }
        }
    }

    debug!(
        "Dispatching {} to {} device(s), {} unresolved",
        command.name(),
        pending.len(),
        outcomes.len()
    );

    let (pending_names, tasks): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
    for (name, joined) in pending_names.into_iter().zip(join_all(tasks).await) {
        let outcome =
            joined.unwrap_or_else(|e| Outcome::Failure(DeviceError::TaskFailed(e.to_string())));
        record(command.name(), &name, &outcome);
        outcomes.insert(name, outcome);
    }

    outcomes
}

async fn run<C: DeviceCommand>(
    entry: &RegistryEntry,
    command: &C,
    timeout: Option<Duration>,
) -> Outcome<C::Output> {
    let started = Instant::now();
    let work = async {
        let Some(mut handle) = entry.lock().await else {
            return Err(DeviceError::NotFound);
        };
        command
            .execute(entry.kind(), &mut **handle)
            .await
            .map_err(DeviceError::from)
    };

    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or_else(|_| Err(DeviceError::TimedOut(limit.as_millis() as u64))),
        None => work.await,
    };

    metrics::histogram!("device_operation_duration_seconds", "command" => command.name())
        .record(started.elapsed().as_secs_f64());

    match result {
        Ok(output) => Outcome::Success(output),
        Err(e) => Outcome::Failure(e),
    }
}

fn record<T>(command: &'static str, device: &str, outcome: &Outcome<T>) {
    let label = match outcome {
        Outcome::Success(_) => "success",
        Outcome::Failure(e) => {
            warn!(%device, command, "Device operation failed: {}", e);
            "failure"
        }
    };
    metrics::counter!(
        "device_operations_total",
        "command" => command,
        "device" => device.to_string(),
        "outcome" => label
    )
    .increment(1);
}
