//! API error body: `{"success": false, "error": {"kind", "message"}}`.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use prepai_types::InterviewError;

#[derive(Debug)]
pub enum ApiError {
    Interview(InterviewError),
    /// LLM-bound request exceeded the gateway timeout (seconds).
    Timeout(u64),
    /// Concurrency limiter closed.
    Overloaded,
    /// Upload exceeded `max_upload_bytes`.
    PayloadTooLarge(String),
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: ErrorDetail<'a>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Interview(error) => match error {
                InterviewError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                InterviewError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                InterviewError::Forbidden(_) => StatusCode::FORBIDDEN,
                InterviewError::NotFound(_) => StatusCode::NOT_FOUND,
                InterviewError::Conflict(_) => StatusCode::CONFLICT,
                InterviewError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Interview(error) => error.kind(),
            Self::Timeout(_) => "timeout",
            Self::Overloaded => "overloaded",
            Self::PayloadTooLarge(_) => "payload_too_large",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Interview(error) => error.message().to_string(),
            Self::Timeout(secs) => format!("request timed out after {secs}s"),
            Self::Overloaded => "server is not accepting more requests".to_string(),
            Self::PayloadTooLarge(detail) => detail.clone(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Interview(InterviewError::InvalidRequest(message.into()))
    }
}

impl From<InterviewError> for ApiError {
    fn from(error: InterviewError) -> Self {
        Self::Interview(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::invalid(format!("expected a multipart upload: {}", rejection.body_text()))
    }
}

impl From<WebSocketUpgradeRejection> for ApiError {
    fn from(rejection: WebSocketUpgradeRejection) -> Self {
        Self::invalid(format!("websocket upgrade required: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge(format!("upload too large: {}", error.body_text()));
        }
        Self::invalid(format!("invalid multipart upload: {}", error.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.message();
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                kind: self.kind(),
                message: &message,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}
