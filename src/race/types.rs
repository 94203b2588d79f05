//! Race result types

use crate::contestant::ContestantId;
use serde::Serialize;
use thiserror::Error;

/// How far one contestant trailed the winner of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContestantLag {
    pub contestant: ContestantId,
    pub name: String,
    /// Milliseconds behind the winner, never negative
    pub lag_ms: i64,
}

/// Outcome of one settled block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockResult {
    pub block: u64,
    pub winner: ContestantId,
    pub winner_name: String,
    /// Winner's arrival time (epoch milliseconds)
    pub winning_time_ms: i64,
    /// Canonical header timestamp (epoch seconds)
    pub block_timestamp_secs: u64,
    /// `winning_time_ms - block_timestamp_secs * 1000`; negative means the
    /// winner announced the block before its header timestamp
    pub timestamp_lag_ms: i64,
    /// Every other contestant, fastest first
    pub trailing: Vec<ContestantLag>,
}

/// Per-contestant figures in an [`AggregateSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContestantStats {
    pub name: String,
    pub wins: u64,
    /// Mean milliseconds behind the winner over all settled blocks
    pub average_lag_ms: f64,
}

/// Point-in-time view of the running totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    pub block_count: u64,
    /// Declaration order
    pub contestants: Vec<ContestantStats>,
    pub average_timestamp_lag_ms: f64,
}

/// Errors raised while settling a block
#[derive(Debug, Error)]
pub enum RaceError {
    #[error("failed to fetch timestamp for block {block}: {source}")]
    Timestamp {
        block: u64,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
