//! Ethereum JSON-RPC message shapes
//!
//! Just enough of the protocol for `eth_getBlockByNumber` over HTTP and
//! `eth_subscribe("newHeads")` over WebSocket.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON-RPC level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("invalid hex quantity {0:?}")]
    InvalidQuantity(String),

    #[error("rpc error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("response has neither result nor error")]
    EmptyResponse,
}

/// Outgoing request
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Error object of a failed call
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Reply to a [`Request`]
#[derive(Debug, Deserialize)]
pub struct Response<T> {
    #[serde(default)]
    pub id: Option<u64>,
    pub result: Option<T>,
    pub error: Option<ErrorObject>,
}

impl<T> Response<T> {
    /// The result, or the remote error. `null` results come back as `None`.
    pub fn into_result(self) -> Result<Option<T>, RpcError> {
        if let Some(e) = self.error {
            return Err(RpcError::Remote {
                code: e.code,
                message: e.message,
            });
        }
        Ok(self.result)
    }
}

/// Block header fields we read; everything else is ignored
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub number: String,
    pub timestamp: String,
}

impl BlockHeader {
    pub fn number(&self) -> Result<u64, RpcError> {
        parse_quantity(&self.number)
    }

    pub fn timestamp(&self) -> Result<u64, RpcError> {
        parse_quantity(&self.timestamp)
    }
}

/// Server push on an `eth_subscribe` subscription
#[derive(Debug, Deserialize)]
pub struct SubscriptionMessage<T> {
    pub method: String,
    pub params: SubscriptionParams<T>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionParams<T> {
    pub subscription: String,
    pub result: T,
}

/// Encode a quantity as `0x`-prefixed hex without leading zeros
pub fn quantity(value: u64) -> String {
    format!("{:#x}", value)
}

/// Decode a `0x`-prefixed hex quantity
pub fn parse_quantity(s: &str) -> Result<u64, RpcError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .filter(|d| !d.is_empty())
        .ok_or_else(|| RpcError::InvalidQuantity(s.to_string()))?;
    u64::from_str_radix(digits, 16).map_err(|_| RpcError::InvalidQuantity(s.to_string()))
}
