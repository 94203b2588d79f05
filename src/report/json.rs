//! JSON-lines output

use super::Reporter;
use crate::race::{AggregateSnapshot, BlockResult};
use serde::Serialize;

/// Tagged record written for each report
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonRecord<'a> {
    Block(&'a BlockResult),
    Aggregate(&'a AggregateSnapshot),
}

/// Prints one JSON object per result on stdout
#[derive(Debug, Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    fn emit(record: &JsonRecord<'_>) {
        match serde_json::to_string(record) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(error = %e, "Failed to serialize report"),
        }
    }
}

impl Reporter for JsonReporter {
    fn block_settled(&self, result: &BlockResult) {
        Self::emit(&JsonRecord::Block(result));
    }

    fn aggregate(&self, snapshot: &AggregateSnapshot) {
        Self::emit(&JsonRecord::Aggregate(snapshot));
    }
}
