//! Pending key input

use std::collections::VecDeque;

/// Ordered buffer of escaped key chunks awaiting transmission
///
/// A chunk leaves the queue when it is drained into a request payload,
/// not when the host acknowledges it.
#[derive(Debug, Default)]
pub struct InputQueue {
    chunks: VecDeque<String>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk at the tail
    pub fn enqueue(&mut self, chunk: impl Into<String>) {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.chunks.push_back(chunk);
        }
    }

    /// Concatenate every chunk in arrival order and empty the queue
    pub fn drain_all(&mut self) -> String {
        let mut payload = String::with_capacity(self.chunks.iter().map(String::len).sum());
        for chunk in self.chunks.drain(..) {
            payload.push_str(&chunk);
        }
        payload
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut queue = InputQueue::new();
        queue.enqueue("A");
        queue.enqueue("B");
        queue.enqueue("C");
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain_all(), "ABC");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty_queue() {
        let mut queue = InputQueue::new();
        assert_eq!(queue.drain_all(), "");
    }

    #[test]
    fn test_multi_byte_chunks_stay_intact() {
        let mut queue = InputQueue::new();
        queue.enqueue("%1B%5BA");
        queue.enqueue("ls+-l");
        queue.enqueue("%0D");
        assert_eq!(queue.drain_all(), "%1B%5BAls+-l%0D");
    }

    #[test]
    fn test_enqueue_after_drain() {
        let mut queue = InputQueue::new();
        queue.enqueue("a");
        queue.drain_all();
        queue.enqueue("b");
        assert_eq!(queue.drain_all(), "b");
    }

    #[test]
    fn test_empty_chunks_are_skipped() {
        let mut queue = InputQueue::new();
        queue.enqueue("");
        assert!(queue.is_empty());
    }
}
