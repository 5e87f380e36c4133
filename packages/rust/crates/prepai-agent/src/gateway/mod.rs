//! Gateway namespace: HTTP routes and the live interview socket.

mod auth;
mod error;
mod http;
mod live;

pub use auth::AuthenticatedUser;
pub use error::ApiError;
pub use http::{
    CompleteRequest, CompleteResponse, DashboardResponse, GatewayHealthResponse, GatewayState,
    HistoryResponse, InitiateRequest, InitiateResponse, NextQuestionResponse,
    ProfileResumeResponse, ProfileResumeUploadResponse, ResumeExtractResponse,
    ResumeScoreResponse, SessionRequest, SubmitRequest, SubmitResponse, router, run_http,
    validate_session_id,
};
