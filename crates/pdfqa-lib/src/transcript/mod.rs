mod types;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use types::ChatTurn;

/// Append-only, in-memory chat history shared between requests.
///
/// Turns are stored in completion order.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Mutex<Vec<ChatTurn>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, turn: ChatTurn) {
        self.lock().push(turn);
    }

    /// Copy of every turn so far.
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChatTurn>> {
        self.turns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
