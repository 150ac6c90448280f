//! Per-session turn locks

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::SessionId;
use crate::error::{AgentError, Result};

/// Idle entries are pruned once the table grows past this size
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per session ID
///
/// Turns on different sessions never contend; turns on the same session queue
/// in FIFO order behind the current holder.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

/// Exclusive right to run a turn on one session, released on drop
#[derive(Debug)]
pub struct SessionGuard {
    session_id: SessionId,
    _guard: OwnedMutexGuard<()>,
}

impl SessionGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: &SessionId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() >= PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(id.clone()).or_default().clone()
    }

    /// Wait up to `wait` for the session, then give up with `SessionConflict`
    pub async fn acquire(&self, id: &SessionId, wait: Duration) -> Result<SessionGuard> {
        let lock = self.lock_for(id);

        match tokio::time::timeout(wait, lock.lock_owned()).await {
            Ok(guard) => Ok(SessionGuard {
                session_id: id.clone(),
                _guard: guard,
            }),
            Err(_) => {
                tracing::warn!(session = %id, ?wait, "Gave up waiting for session lock");
                Err(AgentError::SessionConflict(id.to_string()))
            }
        }
    }

    /// Take the session only if nobody holds it
    pub fn try_acquire(&self, id: &SessionId) -> Option<SessionGuard> {
        self.lock_for(id)
            .try_lock_owned()
            .ok()
            .map(|guard| SessionGuard {
                session_id: id.clone(),
                _guard: guard,
            })
    }

    /// Number of tracked sessions
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_session_is_exclusive() {
        let locks = SessionLocks::new();
        let id = SessionId::parse("s1").unwrap();

        let held = locks.acquire(&id, Duration::from_millis(50)).await.unwrap();
        assert_eq!(held.session_id(), &id);
        assert!(locks.try_acquire(&id).is_none());

        let err = locks.acquire(&id, Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, AgentError::SessionConflict(_)));

        drop(held);
        assert!(locks.try_acquire(&id).is_some());
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_contend() {
        let locks = SessionLocks::new();
        let a = SessionId::parse("a").unwrap();
        let b = SessionId::parse("b").unwrap();

        let _ga = locks.acquire(&a, Duration::from_millis(50)).await.unwrap();
        let gb = locks.acquire(&b, Duration::from_millis(50)).await;
        assert!(gb.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
