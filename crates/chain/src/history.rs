//! Bounded, order-preserving log of raw conversation turns.
//!
//! Seeds follow-up context for a single session. The buffer lives as long
//! as its orchestrator instance — there is no persistence, and one buffer
//! is never shared across sessions.

use std::collections::VecDeque;

/// FIFO-bounded buffer of serialized conversation turns.
#[derive(Debug, Clone)]
pub struct ChatHistoryBuffer {
    buffer: VecDeque<String>,
    max_size: usize,
}

impl ChatHistoryBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: VecDeque::new(),
            max_size,
        }
    }

    /// Append one turn, evicting from the front while over capacity.
    pub fn add_message(&mut self, entry: impl Into<String>) {
        self.buffer.push_back(entry.into());
        while self.buffer.len() > self.max_size {
            self.buffer.pop_front();
        }
    }

    /// The buffered turns joined oldest-first.
    pub fn history(&self) -> String {
        self.buffer
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buffer = ChatHistoryBuffer::new(4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.history(), "");
    }

    #[test]
    fn appends_preserve_order() {
        let mut buffer = ChatHistoryBuffer::new(10);
        buffer.add_message("Question: what is sampling?");
        buffer.add_message("Answer: drawing a subset.");

        assert_eq!(
            buffer.history(),
            "Question: what is sampling? Answer: drawing a subset."
        );
    }

    #[test]
    fn evicts_oldest_first_when_over_capacity() {
        let mut buffer = ChatHistoryBuffer::new(3);
        for i in 1..=7 {
            buffer.add_message(format!("turn {i}"));
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.history(), "turn 5 turn 6 turn 7");
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut buffer = ChatHistoryBuffer::new(3);
        buffer.add_message("turn");
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
