use serde::{Deserialize, Serialize};

pub const LISTENING_PLACEHOLDER: &str = "🎤 Listening...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Session transcript. Entries are only ever appended, except for the
/// voice placeholder which is swapped for the transcription once known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replaces the most recent `role` message if it still reads
    /// `placeholder`; appends otherwise.
    pub fn replace_last_matching(&mut self, role: Role, placeholder: &str, content: impl Into<String>) {
        let content = content.into();
        if let Some(message) = self.messages.iter_mut().rev().find(|m| m.role == role) {
            if message.content == placeholder {
                message.content = content;
                return;
            }
        }
        self.push(role, content);
    }
}
