//! Ranking a settled block

use super::types::{BlockResult, ContestantLag};
use crate::contestant::{ContestantId, ContestantMap, Roster};

/// Contestants ordered by arrival time, fastest first
///
/// Equal times fall back to declaration order, so the ranking is a total
/// order regardless of how the map was filled.
pub fn rank(times: &ContestantMap<i64>) -> Vec<(ContestantId, i64)> {
    let mut ranked: Vec<_> = times.iter().map(|(id, &t)| (id, t)).collect();
    ranked.sort_by_key(|&(id, t)| (t, id));
    ranked
}

/// Build the result of a settled block from every contestant's arrival time
/// and the block's canonical timestamp
pub fn settle(
    block: u64,
    times: &ContestantMap<i64>,
    block_timestamp_secs: u64,
    roster: &Roster,
) -> BlockResult {
    let ranked = rank(times);
    // Rosters are never empty, so there is always a winner
    let (winner, winning_time_ms) = ranked[0];

    let trailing = ranked[1..]
        .iter()
        .map(|&(contestant, t)| ContestantLag {
            contestant,
            name: roster.name(contestant).to_string(),
            lag_ms: t - winning_time_ms,
        })
        .collect();

    BlockResult {
        block,
        winner,
        winner_name: roster.name(winner).to_string(),
        winning_time_ms,
        block_timestamp_secs,
        timestamp_lag_ms: winning_time_ms - block_timestamp_secs as i64 * 1000,
        trailing,
    }
}
