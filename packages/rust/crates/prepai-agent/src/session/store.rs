//! Session store seam.
//!
//! Stores expose compare-and-swap on the record revision instead of field-level
//! writes; every orchestrator mutation is re-read, validate, swap.

use anyhow::Result;
use async_trait::async_trait;

use prepai_types::{NewSession, Session};

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// Stored revision matched; the new record is persisted.
    Swapped,
    /// Stored revision moved on; nothing was written.
    Stale,
    /// No record under that id.
    Missing,
}

/// Result of an owner-checked delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Record exists under a different owner and was left intact.
    Forbidden,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Persist a new session under a freshly assigned id (revision 1).
    async fn insert(&self, new: NewSession) -> Result<Session>;

    async fn load(&self, session_id: &str) -> Result<Option<Session>>;

    /// Write `next` only if the stored revision still equals `expected_revision`.
    ///
    /// Callers set `next.revision = expected_revision + 1`.
    async fn compare_and_swap(&self, expected_revision: u64, next: &Session) -> Result<CasOutcome>;

    /// All sessions owned by `owner_id`, in no particular order.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>>;

    /// Delete in one atomic step, only when `owner_id` owns the record.
    async fn delete_owned(&self, session_id: &str, owner_id: &str) -> Result<DeleteOutcome>;
}
