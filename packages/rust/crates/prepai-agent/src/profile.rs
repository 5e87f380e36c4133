//! Per-user profile storage: the latest uploaded resume file.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One stored resume. `data_base64` holds the raw file bytes, standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResume {
    pub filename: String,
    pub data_base64: String,
    pub size_bytes: usize,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Replace the user's stored resume.
    async fn put_resume(&self, user_id: &str, resume: StoredResume) -> Result<()>;

    async fn get_resume(&self, user_id: &str) -> Result<Option<StoredResume>>;
}

/// Process-local profile store keyed by user id.
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    inner: Arc<RwLock<HashMap<String, StoredResume>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn put_resume(&self, user_id: &str, resume: StoredResume) -> Result<()> {
        self.inner.write().await.insert(user_id.to_string(), resume);
        Ok(())
    }

    async fn get_resume(&self, user_id: &str) -> Result<Option<StoredResume>> {
        Ok(self.inner.read().await.get(user_id).cloned())
    }
}
