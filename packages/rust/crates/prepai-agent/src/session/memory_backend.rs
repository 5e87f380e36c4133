//! In-memory session store: session_id → session record.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use prepai_types::{NewSession, Session};

use super::store::{CasOutcome, DeleteOutcome, SessionStore};

/// Process-local store; every conditional write runs under one write lock.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, new: NewSession) -> Result<Session> {
        let session = Session::from_new(uuid::Uuid::new_v4().to_string(), new);
        let mut g = self.inner.write().await;
        g.insert(session.id.clone(), session.clone());
        tracing::debug!(
            session_id = %session.id,
            total_sessions = g.len(),
            backend = "memory",
            "session inserted"
        );
        Ok(session)
    }

    async fn load(&self, session_id: &str) -> Result<Option<Session>> {
        let g = self.inner.read().await;
        Ok(g.get(session_id).cloned())
    }

    async fn compare_and_swap(&self, expected_revision: u64, next: &Session) -> Result<CasOutcome> {
        let mut g = self.inner.write().await;
        let Some(current) = g.get_mut(&next.id) else {
            return Ok(CasOutcome::Missing);
        };
        if current.revision != expected_revision {
            return Ok(CasOutcome::Stale);
        }
        *current = next.clone();
        tracing::debug!(
            session_id = %next.id,
            revision = next.revision,
            backend = "memory",
            "session swapped"
        );
        Ok(CasOutcome::Swapped)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        let g = self.inner.read().await;
        Ok(g.values()
            .filter(|session| session.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn delete_owned(&self, session_id: &str, owner_id: &str) -> Result<DeleteOutcome> {
        let mut g = self.inner.write().await;
        match g.get(session_id) {
            None => Ok(DeleteOutcome::NotFound),
            Some(session) if !session.is_owned_by(owner_id) => Ok(DeleteOutcome::Forbidden),
            Some(_) => {
                g.remove(session_id);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }
}
