use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for interview operations.
pub type InterviewResult<T> = Result<T, InterviewError>;

/// Failures surfaced to callers of the interview orchestrator.
///
/// Generation and evaluation failures never appear here: they are absorbed into
/// fallback values before a caller can observe them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InterviewError {
    /// Request payload violates a precondition (empty answer, budget out of range).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or invalid credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Credential is valid but does not own the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Session or resource id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation is invalid for the current session state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The session store could not be reached or failed.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl InterviewError {
    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::UpstreamUnavailable(message) => message,
        }
    }

    pub fn session_not_found(session_id: &str) -> Self {
        Self::NotFound(format!("session {session_id} does not exist"))
    }

    pub fn session_forbidden(session_id: &str) -> Self {
        Self::Forbidden(format!("session {session_id} belongs to another user"))
    }

    pub fn session_completed(session_id: &str) -> Self {
        Self::Conflict(format!("session {session_id} is already completed"))
    }

    pub fn store_unavailable() -> Self {
        Self::UpstreamUnavailable("session store unavailable".to_string())
    }
}
