//! Conditional session updates: re-read, validate, compare-and-swap.

use prepai_types::{InterviewError, Session};

use crate::observability::SessionEvent;

use super::store::{CasOutcome, SessionStore};

/// Swap attempts before a contended update gives up with `Conflict`.
const MAX_CAS_ATTEMPTS: usize = 4;

#[derive(Debug)]
pub(crate) enum UpdateOutcome {
    /// The mutation was persisted; holds the stored record.
    Applied(Session),
    /// The mutation declined the fresh record; holds that record unchanged.
    Rejected(Session),
}

/// Log a store failure in full and map it to the generic caller-facing error.
pub(crate) fn store_failure(
    operation: &'static str,
    session_id: Option<&str>,
    error: &anyhow::Error,
) -> InterviewError {
    tracing::error!(
        event = SessionEvent::StoreUnavailable.as_str(),
        operation,
        session_id = session_id.unwrap_or("-"),
        error = %format!("{error:#}"),
        "session store operation failed"
    );
    InterviewError::store_unavailable()
}

/// Load `session_id` and check that `owner_id` owns it.
pub(crate) async fn load_owned(
    store: &dyn SessionStore,
    session_id: &str,
    owner_id: &str,
) -> Result<Session, InterviewError> {
    let session = store
        .load(session_id)
        .await
        .map_err(|error| store_failure("load", Some(session_id), &error))?
        .ok_or_else(|| InterviewError::session_not_found(session_id))?;
    if !session.is_owned_by(owner_id) {
        return Err(InterviewError::session_forbidden(session_id));
    }
    Ok(session)
}

/// Apply `mutate` against the authoritative record.
///
/// `mutate` sees a freshly loaded, owner-checked record and returns the next
/// record, or `None` when its preconditions no longer hold. A stale revision
/// re-reads and re-runs `mutate`.
pub(crate) async fn update_session<F>(
    store: &dyn SessionStore,
    session_id: &str,
    owner_id: &str,
    operation: &'static str,
    mut mutate: F,
) -> Result<UpdateOutcome, InterviewError>
where
    F: FnMut(&Session) -> Option<Session>,
{
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let current = load_owned(store, session_id, owner_id).await?;
        let Some(mut next) = mutate(&current) else {
            return Ok(UpdateOutcome::Rejected(current));
        };
        next.revision = current.revision + 1;
        debug_assert!(next.counts_consistent());
        let outcome = store
            .compare_and_swap(current.revision, &next)
            .await
            .map_err(|error| store_failure(operation, Some(session_id), &error))?;
        match outcome {
            CasOutcome::Swapped => return Ok(UpdateOutcome::Applied(next)),
            CasOutcome::Missing => return Err(InterviewError::session_not_found(session_id)),
            CasOutcome::Stale => {
                tracing::debug!(
                    event = SessionEvent::UpdateRetried.as_str(),
                    operation,
                    session_id,
                    attempt,
                    expected_revision = current.revision,
                    "session revision moved; retrying update"
                );
            }
        }
    }
    tracing::warn!(
        event = SessionEvent::UpdateConflict.as_str(),
        operation,
        session_id,
        attempts = MAX_CAS_ATTEMPTS,
        "session update lost every compare-and-swap"
    );
    Err(InterviewError::Conflict(format!(
        "session {session_id} is being modified concurrently; retry"
    )))
}
