//! block-race: latency race between Ethereum RPC endpoints
//!
//! This library provides the core components for:
//! - `newHeads` block feeds over WebSocket, one per endpoint
//! - Recording arrival times and settling each fully announced block
//! - Canonical block timestamps via HTTP JSON-RPC
//! - Ranking, lag-behind-leader and running aggregates
//! - A FIFO offset queue and a serial async task queue
//! - Text/JSON reporting, logging and Prometheus metrics

pub mod authority;
pub mod cli;
pub mod config;
pub mod contestant;
pub mod feed;
pub mod monitor;
pub mod queue;
pub mod race;
pub mod report;
pub mod rpc;
pub mod telemetry;
pub mod ws;
