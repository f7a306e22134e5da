//! Conversation state for a chat session

use serde::{Deserialize, Serialize};

use crate::{ChatMessage, Error, Result, Role};

/// Lifecycle state of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Empty,
    Active,
}

/// Append-only, ordered log of user and assistant turns.
///
/// Transitions:
/// - `append` moves `Empty -> Active`
/// - `upload_completed` always moves to `Empty`, since answers given against the
///   previous corpus no longer reflect what retrieval would return
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConversationState {
        if self.turns.is_empty() {
            ConversationState::Empty
        } else {
            ConversationState::Active
        }
    }

    /// Append a turn. System messages are not part of the history.
    pub fn append(&mut self, turn: ChatMessage) -> Result<()> {
        if turn.role == Role::System {
            return Err(Error::InvalidInput(
                "conversation turns must come from the user or the assistant".to_string(),
            ));
        }
        self.turns.push(turn);
        Ok(())
    }

    /// All turns in the order they were appended
    pub fn all(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// A new document set was ingested; discard the history
    pub fn upload_completed(&mut self) -> ConversationState {
        self.turns.clear();
        ConversationState::Empty
    }
}
