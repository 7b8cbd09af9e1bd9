use std::collections::HashMap;

use shared::domain::{MessageId, ProfileField, UserId};
use tokio::sync::Mutex;

/// Registration answers collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub pronouns: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Name,
    Pronouns { name: String },
    Description { name: String, pronouns: String },
    Photo(Draft),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    Registration(Registration),
    /// Waiting for text for `field`; `card` is the profile message to re-render.
    EditText { field: ProfileField, card: MessageId },
    EditPhoto { card: MessageId },
}

impl DialogueState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogueState::Idle)
    }
}

/// In-process dialogue state per identity. Lost on restart.
#[derive(Debug, Default)]
pub struct Sessions {
    states: Mutex<HashMap<UserId, DialogueState>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: UserId) -> DialogueState {
        self.states
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set(&self, user_id: UserId, state: DialogueState) {
        let mut states = self.states.lock().await;
        if state.is_idle() {
            states.remove(&user_id);
        } else {
            states.insert(user_id, state);
        }
    }

    /// Identities currently in the middle of a dialogue.
    pub async fn active(&self) -> usize {
        self.states.lock().await.len()
    }
}
