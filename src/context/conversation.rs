use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry of a session's append-only conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<Vec<u8>>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>, image: Option<Vec<u8>>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            image,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            image: None,
        }
    }

    /// Typed chat message for this turn; attached image bytes are not replayed.
    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            TurnRole::User => ChatMessage::user(self.text.clone()),
            TurnRole::Assistant => ChatMessage::assistant(self.text.clone()),
        }
    }
}
