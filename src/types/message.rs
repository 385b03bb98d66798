//! Conversational message types

use serde::{Deserialize, Serialize};

/// Author of a conversational turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human asking questions
    User,
    /// The generated answers
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One conversational turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// Insertion timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Message {
    /// Create a new message stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: chrono::Utc::now(),
        }
    }
}
