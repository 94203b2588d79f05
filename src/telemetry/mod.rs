//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{
    increment_counter, init_metrics_exporter, record_latency, set_gauge, CounterMetric,
    GaugeMetric, LatencyMetric,
};

use crate::config::TelemetryConfig;

/// Initialize all telemetry subsystems
///
/// The Prometheus exporter is only installed when a metrics port is
/// configured. Without one the `metrics` macros are no-ops.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        init_metrics_exporter(port)?;
    }

    Ok(())
}
