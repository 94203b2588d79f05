//! Growable FIFO buffer with a read offset

use super::QueueError;

/// FIFO buffer backed by a `Vec` and a read offset
///
/// Popping only advances the offset. Once the consumed prefix is at least
/// half of the backing vector it is drained in one go, so push and pop stay
/// amortized O(1) and memory does not grow with the number of pops.
#[derive(Debug)]
pub struct OffsetQueue<T> {
    items: Vec<Option<T>>,
    offset: usize,
}

impl<T> OffsetQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
        }
    }

    /// Number of items waiting to be popped
    pub fn len(&self) -> usize {
        self.items.len() - self.offset
    }

    /// True when there is nothing to pop
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an item at the back
    pub fn push(&mut self, item: T) {
        self.items.push(Some(item));
    }

    /// Remove and return the oldest item
    pub fn pop(&mut self) -> Result<T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Empty);
        }

        let item = self.items[self.offset].take().ok_or(QueueError::Empty)?;
        self.offset += 1;

        if self.items.len() <= 2 * self.offset {
            self.items.drain(..self.offset);
            self.offset = 0;
        }

        Ok(item)
    }

    /// Drop every queued item
    pub fn clear(&mut self) {
        self.items.clear();
        self.offset = 0;
    }

    /// Length of the backing vector, including the consumed prefix
    #[cfg(test)]
    fn backing_len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for OffsetQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
