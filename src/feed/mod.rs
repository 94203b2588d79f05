//! Block announcement feeds
//!
//! Each contestant delivers a stream of [`BlockNotice`]s, stamped with the
//! local time the announcement was received.

mod new_heads;

pub use new_heads::NewHeadsFeed;

use crate::contestant::ContestantId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// A contestant announced a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNotice {
    pub contestant: ContestantId,
    pub block: u64,
    /// Local receive time
    pub received_at: DateTime<Utc>,
}

/// Trait for block feed implementations
#[async_trait]
pub trait BlockFeed: Send + Sync {
    /// Contestant this feed reports for
    fn contestant(&self) -> ContestantId;

    /// Subscribe to block announcements
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<BlockNotice>>;
}
