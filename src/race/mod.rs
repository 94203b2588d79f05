//! Block race
//!
//! Decides, for every block all contestants have announced, who announced
//! it first and by how much, and keeps running totals:
//!
//! 1. [`SettlementEngine`] records arrivals and detects completed blocks
//! 2. Completed blocks are settled one at a time on a serial queue
//! 3. [`settle`] ranks contestants, ties going to declaration order
//! 4. [`Aggregates`] folds each result into the totals

mod aggregates;
mod engine;
mod ranking;
mod types;

pub use aggregates::Aggregates;
pub use engine::{SettlementEngine, SettlementHandle};
pub use ranking::{rank, settle};
pub use types::{AggregateSnapshot, BlockResult, ContestantLag, ContestantStats, RaceError};
