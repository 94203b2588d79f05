//! Block timestamps over HTTP JSON-RPC

use super::TimeAuthority;
use crate::rpc::{self, BlockHeader, Request, Response};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Fetches block headers with `eth_getBlockByNumber`
pub struct HttpTimeAuthority {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

impl HttpTimeAuthority {
    /// Create a client for the JSON-RPC endpoint at `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, block: u64) -> Request<'static> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Request::new(
            id,
            "eth_getBlockByNumber",
            json!([rpc::quantity(block), false]),
        )
    }

    /// Pull the timestamp out of an `eth_getBlockByNumber` reply
    fn parse_timestamp(block: u64, response: Response<BlockHeader>) -> anyhow::Result<u64> {
        let header = response
            .into_result()?
            .ok_or_else(|| anyhow::anyhow!("block {} not found", block))?;
        Ok(header.timestamp()?)
    }
}

#[async_trait]
impl TimeAuthority for HttpTimeAuthority {
    async fn block_timestamp(&self, block: u64) -> anyhow::Result<u64> {
        tracing::debug!(block, url = %self.url, "Fetching block timestamp");

        let response = self
            .client
            .post(&self.url)
            .json(&self.request(block))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("RPC HTTP error: {} - {}", status, body);
        }

        let reply: Response<BlockHeader> = response.json().await?;
        Self::parse_timestamp(block, reply)
    }
}
