//! In-memory session store (for development/testing)

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{Session, SessionId, SessionStore, SessionSummary};
use crate::error::{AgentError, Result};
use crate::message::Message;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Session("session store lock poisoned".into())
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Vec<Message>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions
            .get(id)
            .map(|s| s.conversation.messages().to_vec())
            .unwrap_or_default())
    }

    async fn append(&self, id: &SessionId, messages: &[Message]) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| Session::with_id(id.clone()));
        session.conversation.extend(messages.iter().cloned());
        session.touch();
        Ok(())
    }

    async fn latest(&self, id: &SessionId) -> Result<Option<Message>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions
            .get(id)
            .and_then(|s| s.conversation.last().cloned()))
    }

    async fn list(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        let mut result: Vec<_> = sessions.values().map(Session::summary).collect();

        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result.truncate(limit);

        Ok(result)
    }
}
