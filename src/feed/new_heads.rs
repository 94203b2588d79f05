//! `eth_subscribe("newHeads")` feed over WebSocket

use super::{BlockFeed, BlockNotice};
use crate::contestant::ContestantId;
use crate::rpc::{BlockHeader, Request, Response, RpcError, SubscriptionMessage};
use crate::ws::{WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;

/// Request id used for the subscription call
const SUBSCRIBE_ID: u64 = 1;

/// A decoded text frame
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// New block header
    Head(u64),
    /// Subscription accepted, with its id
    Subscribed(String),
    /// Subscription rejected
    Rejected(RpcError),
}

/// Block feed backed by a JSON-RPC WebSocket endpoint
pub struct NewHeadsFeed {
    contestant: ContestantId,
    name: String,
    config: WsConfig,
}

impl NewHeadsFeed {
    /// Create a feed for `contestant`, connecting with `config`
    pub fn new(contestant: ContestantId, name: impl Into<String>, config: WsConfig) -> Self {
        Self {
            contestant,
            name: name.into(),
            config,
        }
    }

    /// The `eth_subscribe` call sent on every (re)connect
    fn subscribe_request() -> serde_json::Result<String> {
        serde_json::to_string(&Request::new(
            SUBSCRIBE_ID,
            "eth_subscribe",
            json!(["newHeads"]),
        ))
    }

    /// Decode a text frame; frames we don't care about yield `None`
    fn parse_message(msg: &str) -> Option<Frame> {
        if let Ok(notification) = serde_json::from_str::<SubscriptionMessage<BlockHeader>>(msg) {
            if notification.method != "eth_subscription" {
                return None;
            }
            return notification.params.result.number().ok().map(Frame::Head);
        }

        let reply: Response<String> = serde_json::from_str(msg).ok()?;
        if reply.id != Some(SUBSCRIBE_ID) {
            return None;
        }
        match reply.into_result() {
            Ok(Some(id)) => Some(Frame::Subscribed(id)),
            Ok(None) => None,
            Err(e) => Some(Frame::Rejected(e)),
        }
    }

    /// Run the message processing loop
    async fn run_message_loop(
        contestant: ContestantId,
        name: String,
        mut ws_rx: mpsc::Receiver<WsMessage>,
        ws_tx: mpsc::Sender<String>,
        notice_tx: mpsc::Sender<BlockNotice>,
    ) {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => {
                    // Stamp before parsing so decode time doesn't count as lag
                    let received_at = Utc::now();

                    match Self::parse_message(&text) {
                        Some(Frame::Head(block)) => {
                            tracing::trace!(contestant = %name, block, "New head");
                            let notice = BlockNotice {
                                contestant,
                                block,
                                received_at,
                            };
                            if notice_tx.send(notice).await.is_err() {
                                tracing::debug!(contestant = %name, "Notice receiver dropped, stopping feed");
                                break;
                            }
                        }
                        Some(Frame::Subscribed(id)) => {
                            tracing::info!(contestant = %name, subscription = %id, "Subscribed to newHeads");
                        }
                        Some(Frame::Rejected(e)) => {
                            tracing::error!(contestant = %name, error = %e, "newHeads subscription rejected");
                        }
                        None => {}
                    }
                }
                WsMessage::Connected => {
                    tracing::info!(contestant = %name, "Feed connected, subscribing");
                    let request = match Self::subscribe_request() {
                        Ok(request) => request,
                        Err(e) => {
                            tracing::error!(contestant = %name, error = %e, "Failed to encode subscription");
                            break;
                        }
                    };
                    if ws_tx.send(request).await.is_err() {
                        break;
                    }
                }
                WsMessage::Disconnected => {
                    tracing::warn!(contestant = %name, "Feed disconnected");
                    break;
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::warn!(contestant = %name, attempt, "Feed reconnecting...");
                }
            }
        }
    }
}

#[async_trait]
impl BlockFeed for NewHeadsFeed {
    fn contestant(&self) -> ContestantId {
        self.contestant
    }

    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<BlockNotice>> {
        let (notice_tx, notice_rx) = mpsc::channel(1024);

        tracing::info!(contestant = %self.name, url = %self.config.url, "Subscribing to block feed");

        let client = WsClient::new(self.config.clone());
        let (ws_rx, ws_tx) = client.connect();

        let contestant = self.contestant;
        let name = self.name.clone();
        tokio::spawn(async move {
            Self::run_message_loop(contestant, name, ws_rx, ws_tx, notice_tx).await;
        });

        Ok(notice_rx)
    }
}
