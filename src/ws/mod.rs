//! WebSocket client library
//!
//! Bidirectional WebSocket client with automatic reconnection, ping
//! keepalive and exponential backoff.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsMessage};
