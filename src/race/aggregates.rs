//! Running totals across settled blocks

use super::types::{AggregateSnapshot, BlockResult, ContestantStats};
use crate::contestant::{ContestantMap, Roster};

/// Running totals, updated once per settled block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregates {
    pub block_count: u64,
    pub wins_by_contestant: ContestantMap<u64>,
    /// Sum of milliseconds behind the winner; blocks a contestant won add 0
    pub total_lag_by_contestant: ContestantMap<i64>,
    pub total_lag_from_timestamp: i64,
}

impl Aggregates {
    /// All counters at zero
    pub fn new(roster: &Roster) -> Self {
        Self {
            block_count: 0,
            wins_by_contestant: roster.map(|_| 0),
            total_lag_by_contestant: roster.map(|_| 0),
            total_lag_from_timestamp: 0,
        }
    }

    /// Fold one settled block into the totals
    pub fn record(&mut self, result: &BlockResult) {
        self.block_count += 1;
        self.wins_by_contestant[result.winner] += 1;
        self.total_lag_from_timestamp += result.timestamp_lag_ms;
        for lag in &result.trailing {
            self.total_lag_by_contestant[lag.contestant] += lag.lag_ms;
        }
    }

    /// Averages over every block recorded so far
    pub fn snapshot(&self, roster: &Roster) -> AggregateSnapshot {
        let average = |total: i64| {
            if self.block_count == 0 {
                0.0
            } else {
                total as f64 / self.block_count as f64
            }
        };

        let contestants = roster
            .ids()
            .map(|id| ContestantStats {
                name: roster.name(id).to_string(),
                wins: self.wins_by_contestant[id],
                average_lag_ms: average(self.total_lag_by_contestant[id]),
            })
            .collect();

        AggregateSnapshot {
            block_count: self.block_count,
            contestants,
            average_timestamp_lag_ms: average(self.total_lag_from_timestamp),
        }
    }
}
