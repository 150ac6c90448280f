//! Session Management
//!
//! Per-session conversation history, the storage trait behind it, and the
//! locks that keep two turns of one session from interleaving.

mod file;
mod locks;
mod memory;

pub use file::FileSessionStore;
pub use locks::{SessionGuard, SessionLocks};
pub use memory::MemorySessionStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};

const MAX_SESSION_ID_LEN: usize = 256;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied ID. Blank or oversized IDs are rejected.
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(AgentError::InvalidRequest("session id must not be empty".into()));
        }
        if s.len() > MAX_SESSION_ID_LEN {
            return Err(AgentError::InvalidRequest(format!(
                "session id longer than {MAX_SESSION_ID_LEN} bytes"
            )));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Title generated from the first user message
    pub fn title(&self) -> String {
        self.conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| {
                let preview: String = m.content.chars().take(50).collect();
                if m.content.chars().count() > 50 {
                    format!("{preview}...")
                } else {
                    preview
                }
            })
            .unwrap_or_else(|| format!("Session {}", self.id))
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title(),
            message_count: self.message_count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry for a stored session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session store trait for persistence
///
/// Stores do not serialize access per session; callers hold a
/// [`SessionGuard`] while they load, work on, and append to a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Ordered history, empty for sessions never seen
    async fn load(&self, id: &SessionId) -> Result<Vec<Message>>;

    /// Append messages in order. Either all of them land or none do.
    async fn append(&self, id: &SessionId, messages: &[Message]) -> Result<()>;

    /// Last message of the session
    async fn latest(&self, id: &SessionId) -> Result<Option<Message>> {
        Ok(self.load(id).await?.pop())
    }

    /// Most recently updated sessions first
    async fn list(&self, limit: usize) -> Result<Vec<SessionSummary>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_validation() {
        assert!(SessionId::parse("s1").is_ok());
        assert!(matches!(SessionId::parse("  "), Err(AgentError::InvalidRequest(_))));
        assert!(SessionId::parse("x".repeat(MAX_SESSION_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_title_from_first_user_message() {
        let mut session = Session::with_id(SessionId::parse("s1").unwrap());
        assert_eq!(session.title(), "Session s1");

        session.conversation.push(Message::user("Where is ORD-123?"));
        session.conversation.push(Message::assistant("It has shipped."));
        assert_eq!(session.title(), "Where is ORD-123?");
        assert_eq!(session.summary().message_count, 2);
    }
}
