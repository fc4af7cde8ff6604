//! Append-only conversation store.
//!
//! Messages receive strictly increasing ids at append time and are never
//! reordered, edited, or removed afterwards. No history bound is imposed.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use pitchside_core::types::MessageRole;

/// A single transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: u64,
    role: MessageRole,
    content: String,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    /// The text exactly as submitted or produced.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Local wall-clock `HH:MM`, as shown under each chat bubble.
    pub fn time_label(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

/// Ordered, append-only transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// Append a message and return it. Ids start at 1.
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> &Message {
        let message = Message {
            id: self.next_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Read-only view in insertion order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: u64) -> Option<&Message> {
        // Ids are dense and start at 1.
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.messages.get(idx)
    }
}

// =============================================================================
// Tests
// =============================================================================
