//! Session-scoped conversation memory.

use serde::{Deserialize, Serialize};

/// One user/assistant exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// What the user asked.
    pub user: String,
    /// What the assistant answered.
    pub assistant: String,
}

/// An append-only, ordered log of conversation turns.
///
/// One instance is constructed per interactive session, passed explicitly
/// into retrieval and composition, and discarded when the session ends.
/// Turns are never mutated or removed within a session, and nothing is
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    /// Create an empty conversation memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn.
    pub fn append(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(ConversationTurn { user: user.into(), assistant: assistant.into() });
    }

    /// Return the last `window` turns, oldest first.
    ///
    /// When fewer than `window` turns exist, all of them are returned.
    pub fn recent(&self, window: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(window);
        &self.turns[start..]
    }

    /// Number of turns recorded so far.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(turns: &[(&str, &str)]) -> ConversationMemory {
        let mut memory = ConversationMemory::new();
        for (user, assistant) in turns {
            memory.append(*user, *assistant);
        }
        memory
    }

    #[test]
    fn recent_returns_the_last_window_oldest_first() {
        let memory = memory_with(&[("A", "a"), ("B", "b"), ("C", "c"), ("D", "d")]);
        let recent = memory.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].user, "B");
        assert_eq!(recent[1].user, "C");
        assert_eq!(recent[2].user, "D");
    }

    #[test]
    fn recent_with_a_large_window_returns_everything() {
        let memory = memory_with(&[("A", "a"), ("B", "b"), ("C", "c"), ("D", "d")]);
        let recent = memory.recent(10);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].user, "A");
    }

    #[test]
    fn recent_on_empty_memory_is_empty() {
        assert!(ConversationMemory::new().recent(3).is_empty());
    }
}
