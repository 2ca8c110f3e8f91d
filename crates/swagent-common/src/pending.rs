//! FIFO of deferred work guarded by its own lock.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Unbounded queue producers append to without touching the consumer's state.
///
/// Pushing only takes the queue lock, so a producer is never blocked by
/// whatever the consumer holds while it applies a drained batch.
#[derive(Debug)]
pub struct PendingQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends an item at the back.
    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
    }

    /// Takes every queued item in arrival order, leaving the queue empty.
    pub fn drain(&self) -> Vec<T> {
        let mut items = self.items.lock();
        items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
