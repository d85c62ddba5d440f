// metrics/mod.rs
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

pub fn setup_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to setup metrics: {}", e))?;

    metrics::describe_counter!(
        "device_operations_total",
        "Per-device command outcomes, labelled by command, device and outcome"
    );
    metrics::describe_histogram!(
        "device_operation_duration_seconds",
        metrics::Unit::Seconds,
        "Time one device spent on a command, including waiting for its lock"
    );

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}
