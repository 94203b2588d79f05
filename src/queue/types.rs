//! Queue types

use thiserror::Error;

/// Errors raised by the queues in this module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Pop on an empty buffer. Always a logic bug in the caller.
    #[error("cannot pop from an empty queue")]
    Empty,
    /// The task panicked while running
    #[error("task panicked")]
    TaskPanicked,
    /// The task was dropped before it could run
    #[error("task was abandoned before completion")]
    Abandoned,
}

/// Lifecycle of the serial queue's pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    /// No pump running, buffer empty
    Idle,
    /// A pump is draining the buffer
    Draining,
}
