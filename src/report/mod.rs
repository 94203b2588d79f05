//! Result reporting
//!
//! Settlement hands every [`BlockResult`] and every periodic
//! [`AggregateSnapshot`] to a [`Reporter`]. How they are rendered is up to
//! the implementation.

mod console;
mod json;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

use crate::race::{AggregateSnapshot, BlockResult};
use serde::Deserialize;
use std::sync::Arc;

/// Sink for race results
pub trait Reporter: Send + Sync {
    /// One block has been settled
    fn block_settled(&self, result: &BlockResult);
    /// Periodic (and final) aggregate statistics
    fn aggregate(&self, snapshot: &AggregateSnapshot);
}

/// Output format for race results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Build the reporter for a format, writing to stdout
pub fn stdout_reporter(format: ReportFormat) -> Arc<dyn Reporter> {
    match format {
        ReportFormat::Text => Arc::new(ConsoleReporter::new()),
        ReportFormat::Json => Arc::new(JsonReporter::new()),
    }
}
