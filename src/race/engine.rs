//! Settlement engine
//!
//! Records when each contestant announces each block. Once every contestant
//! has announced a block it is settled: the arrival times are taken out of
//! the records and a settlement task is queued on the [`SerialTaskQueue`],
//! which fetches the canonical timestamp, ranks the contestants and updates
//! the [`Aggregates`].
//!
//! Settlements run in the order blocks became settled, not in block order.
//!
//! A block that some contestant never announces is never settled, and the
//! arrival times other contestants recorded for it are kept for the life of
//! the process. [`SettlementEngine::pending_blocks`] reports how many such
//! blocks are outstanding.

use super::aggregates::Aggregates;
use super::ranking;
use super::types::{AggregateSnapshot, BlockResult, RaceError};
use crate::authority::TimeAuthority;
use crate::contestant::{ContestantId, ContestantMap, Roster};
use crate::queue::{SerialTaskQueue, TaskHandle};
use crate::report::Reporter;
use crate::telemetry::{increment_counter, record_latency, CounterMetric, LatencyMetric};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Handle to a queued settlement
pub type SettlementHandle = TaskHandle<Result<BlockResult, RaceError>>;

/// Everything a settlement task needs, shared by all of them
struct Settler {
    roster: Arc<Roster>,
    authority: Arc<dyn TimeAuthority>,
    reporter: Arc<dyn Reporter>,
    aggregates: Arc<Mutex<Aggregates>>,
    blocks_per_aggregate: u64,
}

impl Settler {
    async fn settle(&self, block: u64, times: ContestantMap<i64>) -> Result<BlockResult, RaceError> {
        let timestamp = self
            .authority
            .block_timestamp(block)
            .await
            .map_err(|e| RaceError::Timestamp {
                block,
                source: e.into(),
            })?;

        let result = ranking::settle(block, &times, timestamp, &self.roster);

        tracing::debug!(
            block,
            winner = %result.winner_name,
            timestamp_lag_ms = result.timestamp_lag_ms,
            "Block settled"
        );
        self.record_metrics(&result);
        self.reporter.block_settled(&result);

        let snapshot = {
            let mut aggregates = self.aggregates.lock();
            aggregates.record(&result);
            (aggregates.block_count % self.blocks_per_aggregate == 0)
                .then(|| aggregates.snapshot(&self.roster))
        };

        if let Some(snapshot) = snapshot {
            self.reporter.aggregate(&snapshot);
        }

        Ok(result)
    }

    fn record_metrics(&self, result: &BlockResult) {
        increment_counter(CounterMetric::BlocksSettled, None);
        increment_counter(CounterMetric::Wins, Some(&result.winner_name));
        record_latency(LatencyMetric::TimestampLag, None, result.timestamp_lag_ms);
        for lag in &result.trailing {
            record_latency(LatencyMetric::LagBehindLeader, Some(&lag.name), lag.lag_ms);
        }
    }
}

/// Tracks block arrivals per contestant and settles completed blocks
pub struct SettlementEngine {
    /// Block number -> arrival time (epoch ms), one map per contestant
    arrivals: Mutex<ContestantMap<HashMap<u64, i64>>>,
    queue: SerialTaskQueue,
    settler: Arc<Settler>,
}

impl SettlementEngine {
    /// Create an engine for `roster`
    ///
    /// `blocks_per_aggregate` must be at least 1; configuration validation
    /// guarantees this for values coming from a config file.
    pub fn new(
        roster: Roster,
        authority: Arc<dyn TimeAuthority>,
        reporter: Arc<dyn Reporter>,
        blocks_per_aggregate: u64,
    ) -> Self {
        let aggregates = Aggregates::new(&roster);
        Self {
            arrivals: Mutex::new(roster.map(|_| HashMap::new())),
            queue: SerialTaskQueue::new(),
            settler: Arc::new(Settler {
                roster: Arc::new(roster),
                authority,
                reporter,
                aggregates: Arc::new(Mutex::new(aggregates)),
                blocks_per_aggregate: blocks_per_aggregate.max(1),
            }),
        }
    }

    /// The contestants taking part
    pub fn roster(&self) -> &Roster {
        &self.settler.roster
    }

    /// Record that `contestant` announced `block` at `arrived_at_ms`
    ///
    /// Only the first announcement per contestant and block counts. When
    /// this completes the block, its arrival times are removed from every
    /// record and a settlement is queued; the returned handle resolves once
    /// that settlement has run. Must be called from within a tokio runtime.
    pub fn on_arrival(
        &self,
        contestant: ContestantId,
        block: u64,
        arrived_at_ms: i64,
    ) -> Option<SettlementHandle> {
        let times = {
            let mut arrivals = self.arrivals.lock();
            arrivals[contestant].entry(block).or_insert(arrived_at_ms);

            if !arrivals.iter().all(|(_, record)| record.contains_key(&block)) {
                tracing::trace!(block, contestant = %self.roster().name(contestant), "Arrival recorded");
                return None;
            }

            let mut times = self.roster().map(|_| 0);
            for (id, record) in arrivals.iter_mut() {
                if let Some(t) = record.remove(&block) {
                    times[id] = t;
                }
            }
            times
        };

        let settler = Arc::clone(&self.settler);
        let handle = self.queue.submit(move || async move {
            let outcome = settler.settle(block, times).await;
            if let Err(e) = &outcome {
                tracing::warn!(block, error = %e, "Dropping block without settlement");
                increment_counter(CounterMetric::TimestampFailures, None);
            }
            outcome
        });

        Some(handle)
    }

    /// Arrival time recorded for a block that has not settled yet
    pub fn arrival(&self, contestant: ContestantId, block: u64) -> Option<i64> {
        self.arrivals.lock()[contestant].get(&block).copied()
    }

    /// Number of distinct blocks announced by some but not all contestants
    pub fn pending_blocks(&self) -> usize {
        let arrivals = self.arrivals.lock();
        let pending: HashSet<u64> = arrivals
            .iter()
            .flat_map(|(_, record)| record.keys().copied())
            .collect();
        pending.len()
    }

    /// Settlements waiting behind the one currently running
    pub fn queued_settlements(&self) -> usize {
        self.queue.len()
    }

    /// Wait for every settlement queued so far to finish
    pub async fn flush(&self) {
        // FIFO: the marker runs only after everything ahead of it
        let _ = self.queue.submit(|| async {}).await;
    }

    /// Copy of the running totals
    pub fn aggregates(&self) -> Aggregates {
        self.settler.aggregates.lock().clone()
    }

    /// Averages over every block settled so far
    pub fn snapshot(&self) -> AggregateSnapshot {
        self.settler
            .aggregates
            .lock()
            .snapshot(&self.settler.roster)
    }
}
