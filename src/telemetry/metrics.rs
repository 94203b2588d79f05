//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Latency metric types, all in milliseconds
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// How far a contestant trailed the block's winner
    LagBehindLeader,
    /// Winner's arrival time minus the canonical block timestamp
    TimestampLag,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Blocks that completed settlement
    BlocksSettled,
    /// Blocks won, labelled by contestant
    Wins,
    /// Settlements dropped because the block timestamp could not be fetched
    TimestampFailures,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Settlement tasks waiting in the serial queue
    SerialQueueDepth,
}

fn latency_name(metric: LatencyMetric) -> &'static str {
    match metric {
        LatencyMetric::LagBehindLeader => "blockrace_lag_behind_leader_ms",
        LatencyMetric::TimestampLag => "blockrace_timestamp_lag_ms",
    }
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::BlocksSettled => "blockrace_blocks_settled_total",
        CounterMetric::Wins => "blockrace_wins_total",
        CounterMetric::TimestampFailures => "blockrace_timestamp_failures_total",
    }
}

fn gauge_name(metric: GaugeMetric) -> &'static str {
    match metric {
        GaugeMetric::SerialQueueDepth => "blockrace_serial_queue_depth",
    }
}

/// Install the Prometheus exporter with an HTTP listener on `port`
pub fn init_metrics_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Record a latency measurement, optionally labelled by contestant
pub fn record_latency(metric: LatencyMetric, contestant: Option<&str>, value_ms: i64) {
    let name = latency_name(metric);
    match contestant {
        Some(contestant) => {
            metrics::histogram!(name, "contestant" => contestant.to_string())
                .record(value_ms as f64)
        }
        None => metrics::histogram!(name).record(value_ms as f64),
    }
}

/// Increment a counter, optionally labelled by contestant
pub fn increment_counter(metric: CounterMetric, contestant: Option<&str>) {
    let name = counter_name(metric);
    match contestant {
        Some(contestant) => {
            metrics::counter!(name, "contestant" => contestant.to_string()).increment(1)
        }
        None => metrics::counter!(name).increment(1),
    }
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(gauge_name(metric)).set(value);
}
