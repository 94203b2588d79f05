//! Canonical block timestamps
//!
//! The race ranks contestants purely by arrival time. The canonical
//! timestamp from the block header is only used to measure how long after
//! the block was produced the winner announced it.

mod http;

pub use http::HttpTimeAuthority;

use async_trait::async_trait;

/// Source of canonical block timestamps
#[async_trait]
pub trait TimeAuthority: Send + Sync {
    /// Header timestamp of `block`, in seconds since the Unix epoch
    async fn block_timestamp(&self, block: u64) -> anyhow::Result<u64>;
}
