//! Human-readable console output

use super::Reporter;
use crate::race::{AggregateSnapshot, BlockResult};
use chrono::{Local, TimeZone};

/// Prints results as plain text on stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    /// Text printed for a settled block
    pub fn format_block(result: &BlockResult) -> String {
        let published = Local
            .timestamp_millis_opt(result.winning_time_ms)
            .single()
            .map(|t| t.format("%-I:%M:%S %p").to_string())
            .unwrap_or_else(|| result.winning_time_ms.to_string());

        let lag = result.timestamp_lag_ms;
        let mut out = format!(
            "Block {} published at {} by {}!\n  ...{:.2}s {} the block timestamp.\n",
            result.block,
            published,
            result.winner_name,
            lag.unsigned_abs() as f64 / 1000.0,
            if lag < 0 { "before" } else { "after" },
        );

        for trailing in &result.trailing {
            out.push_str(&format!(
                "{} trails the leader by {:.2}s.\n",
                trailing.name,
                trailing.lag_ms as f64 / 1000.0
            ));
        }

        out
    }

    /// Text printed for an aggregate snapshot
    ///
    /// Wins are listed most first, lags smallest first.
    pub fn format_aggregate(snapshot: &AggregateSnapshot) -> String {
        let mut by_wins: Vec<_> = snapshot.contestants.iter().collect();
        by_wins.sort_by(|a, b| b.wins.cmp(&a.wins));

        let mut by_lag: Vec<_> = snapshot.contestants.iter().collect();
        by_lag.sort_by(|a, b| a.average_lag_ms.total_cmp(&b.average_lag_ms));

        let mut out = format!(
            "AGGREGATION TIME!\n\nOver the last {} blocks...\n\nTimes each provider published first:\n\n",
            snapshot.block_count
        );
        for c in by_wins {
            out.push_str(&format!("  {}: {}\n", c.name, c.wins));
        }

        out.push_str("\nAverage seconds trailing the leader:\n\n");
        for c in by_lag {
            out.push_str(&format!("  {}: {:.2}s\n", c.name, c.average_lag_ms / 1000.0));
        }

        out.push_str(&format!(
            "\nAverage time from block timestamp to provider discovery: {:.2}s\n",
            snapshot.average_timestamp_lag_ms / 1000.0
        ));

        out
    }
}

impl Reporter for ConsoleReporter {
    fn block_settled(&self, result: &BlockResult) {
        println!("{}", Self::format_block(result));
    }

    fn aggregate(&self, snapshot: &AggregateSnapshot) {
        println!("{}", Self::format_aggregate(snapshot));
    }
}
