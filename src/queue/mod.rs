//! Task serialization
//!
//! [`OffsetQueue`] is a plain FIFO buffer. [`SerialTaskQueue`] builds on it
//! to run asynchronous tasks strictly one at a time, in submission order.

mod offset;
mod serial;
mod types;

pub use offset::OffsetQueue;
pub use serial::{SerialTaskQueue, TaskHandle};
pub use types::{PumpState, QueueError};
