//! Append-only conversation log.

use std::sync::{Arc, PoisonError, RwLock};

use super::turn::Turn;

/// Ordered, append-only log of turns.
///
/// Turns are stored behind `Arc` and never handed out mutably, so readers
/// may hold on to a snapshot while the log keeps growing.
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: RwLock<Vec<Arc<Turn>>>,
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end of the log and return the stored value.
    pub fn append(&self, turn: Turn) -> Arc<Turn> {
        let turn = Arc::new(turn);
        let position = {
            let mut turns = self.turns.write().unwrap_or_else(PoisonError::into_inner);
            turns.push(Arc::clone(&turn));
            turns.len()
        };
        tracing::debug!(role = %turn.role, position, "turn appended");
        turn
    }

    /// Snapshot of every turn in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Turn>> {
        self.turns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of stored turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no turn has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
