//! File-backed session store
//!
//! One JSON document per session. Writes go to a temp file that is renamed
//! over the old document, so an append is all-or-nothing.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Session, SessionId, SessionStore, SessionSummary};
use crate::error::{AgentError, Result};
use crate::message::Message;

pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Session IDs are opaque, so unsafe ones are hex-encoded.
    fn path_for(&self, id: &SessionId) -> PathBuf {
        let raw = id.as_str();
        let safe = raw.len() <= 128
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        let stem = if safe {
            format!("s-{raw}")
        } else {
            let mut hex = String::from("h-");
            for byte in raw.as_bytes() {
                let _ = write!(hex, "{byte:02x}");
            }
            hex
        };
        self.dir.join(format!("{stem}.json"))
    }

    async fn read_session(path: &Path) -> Result<Option<Session>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_session(&self, path: &Path, session: &Session) -> Result<()> {
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        let bytes = serde_json::to_vec_pretty(session)?;

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AgentError::Session(format!(
                "failed to commit session {}: {e}",
                session.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Vec<Message>> {
        Ok(Self::read_session(&self.path_for(id))
            .await?
            .map(|s| s.conversation.into_messages())
            .unwrap_or_default())
    }

    async fn append(&self, id: &SessionId, messages: &[Message]) -> Result<()> {
        let path = self.path_for(id);
        let mut session = Self::read_session(&path)
            .await?
            .unwrap_or_else(|| Session::with_id(id.clone()));

        session.conversation.extend(messages.iter().cloned());
        session.touch();
        self.write_session(&path, &session).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut result = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_session(&path).await {
                Ok(Some(session)) => result.push(session.summary()),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session"),
            }
        }

        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result.truncate(limit);
        Ok(result)
    }
}
