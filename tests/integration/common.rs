//! Test doubles shared by the integration tests

use async_trait::async_trait;
use block_race::authority::TimeAuthority;
use block_race::contestant::ContestantId;
use block_race::feed::{BlockFeed, BlockNotice};
use block_race::race::{AggregateSnapshot, BlockResult};
use block_race::report::Reporter;
use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Timestamps from a fixed table; unknown blocks fail
pub struct TableAuthority(pub HashMap<u64, u64>);

impl TableAuthority {
    pub fn new(entries: &[(u64, u64)]) -> Self {
        Self(entries.iter().copied().collect())
    }
}

#[async_trait]
impl TimeAuthority for TableAuthority {
    async fn block_timestamp(&self, block: u64) -> anyhow::Result<u64> {
        self.0
            .get(&block)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("block {} not found", block))
    }
}

/// Keeps everything it is given
#[derive(Default)]
pub struct Recorder {
    pub blocks: Mutex<Vec<BlockResult>>,
    pub snapshots: Mutex<Vec<AggregateSnapshot>>,
}

impl Reporter for Recorder {
    fn block_settled(&self, result: &BlockResult) {
        self.blocks.lock().push(result.clone());
    }

    fn aggregate(&self, snapshot: &AggregateSnapshot) {
        self.snapshots.lock().push(snapshot.clone());
    }
}

/// Replays `(block, epoch ms)` announcements, then ends or stays open
pub struct ScriptedFeed {
    pub contestant: ContestantId,
    pub script: Vec<(u64, i64)>,
    pub hold_open: bool,
}

#[async_trait]
impl BlockFeed for ScriptedFeed {
    fn contestant(&self) -> ContestantId {
        self.contestant
    }

    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<BlockNotice>> {
        let (tx, rx) = mpsc::channel(64);
        let contestant = self.contestant;
        let script = self.script.clone();
        let hold_open = self.hold_open;

        tokio::spawn(async move {
            for (block, ms) in script {
                let notice = BlockNotice {
                    contestant,
                    block,
                    received_at: Utc.timestamp_millis_opt(ms).unwrap(),
                };
                if tx.send(notice).await.is_err() {
                    return;
                }
            }
            if hold_open {
                tx.closed().await;
            }
        });

        Ok(rx)
    }
}

/// `newHeads` notification frame for `block`
pub fn head_frame(block: u64) -> String {
    format!(
        r#"{{"jsonrpc":"2.0","method":"eth_subscription","params":{{"subscription":"0xabc","result":{{"number":"{:#x}","timestamp":"0x0","hash":"0x00"}}}}}}"#,
        block
    )
}

/// WebSocket JSON-RPC node that acknowledges `eth_subscribe` and then
/// announces `blocks`, keeping the connection open afterwards
pub async fn spawn_ws_node(blocks: Vec<u64>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let blocks = blocks.clone();
            tokio::spawn(async move {
                let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

                while let Some(Ok(msg)) = ws.next().await {
                    if let Message::Text(text) = msg {
                        assert!(text.contains("eth_subscribe"));
                        break;
                    }
                }
                let ack = r#"{"jsonrpc":"2.0","id":1,"result":"0xabc"}"#;
                ws.send(Message::Text(ack.to_string())).await.unwrap();
                for block in blocks {
                    ws.send(Message::Text(head_frame(block))).await.unwrap();
                }

                // Answer pings until the client goes away
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });

    format!("ws://{}", addr)
}

/// Read one HTTP request, headers and body, off `socket`
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        request.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&request);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= end + 4 + length {
                return;
            }
        }
    }
}

/// HTTP JSON-RPC node answering every request with the same block header
pub async fn spawn_http_node(timestamp_secs: u64) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = format!(
        r#"{{"jsonrpc":"2.0","id":1,"result":{{"number":"0x1","timestamp":"{:#x}"}}}}"#,
        timestamp_secs
    );

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let body = body.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}
