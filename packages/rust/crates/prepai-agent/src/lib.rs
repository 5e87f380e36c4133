//! PrepAI interview agent: session orchestration over pluggable stores and LLM interviewers.
//!
//! - **Orchestrator**: create → submit/next → complete, every write a compare-and-swap on the session revision.
//! - **Interviewer**: chat-completions question generator and answer evaluator with fixed fallbacks.
//! - **Gateway**: `/api` HTTP routes plus the live interview WebSocket.
//! - **Resume and profile**: text extraction and ATS-style scoring plus per-user resume storage.

#![allow(missing_docs)]

mod config;
mod gateway;
mod identity;
mod interviewer;
mod llm;
mod observability;
mod orchestrator;
mod profile;
mod resume;
mod session;

pub use config::{
    AuthConfig, AuthSettings, DEV_SECRET_KEY, InterviewConfig, InterviewPolicy, InterviewSettings,
    LlmConfig, LlmSettings, MISTRAL_DEFAULT_URL, OLLAMA_DEFAULT_URL, RuntimeSettings,
    ServerConfig, ServerSettings, SessionBackendKind, SessionSettings, load_runtime_settings,
    load_runtime_settings_from_paths, runtime_settings_paths, set_config_home_override,
};
pub use gateway::{
    ApiError, AuthenticatedUser, CompleteRequest, CompleteResponse, DashboardResponse,
    GatewayHealthResponse, GatewayState, HistoryResponse, InitiateRequest, InitiateResponse,
    NextQuestionResponse, ProfileResumeResponse, ProfileResumeUploadResponse,
    ResumeExtractResponse, ResumeScoreResponse, SessionRequest, SubmitRequest, SubmitResponse,
    router, run_http, validate_session_id,
};
pub use identity::{HmacIdentityProvider, Identity, IdentityError, IdentityProvider};
pub use interviewer::{
    AnswerEvaluator, CodingChallenge, DsaDifficulty, EvaluationRequest, GenerationError,
    LlmInterviewer, QuestionGenerator, QuestionRequest, ResumeScoreRequest, ResumeScorer,
    coding_challenge, coding_challenges, dsa_question, fallback_question, fallback_resume_score,
    fallback_review, parse_question, parse_resume_score, parse_review, truncate_chars,
};
pub use llm::{ChatMessage, LlmClient};
pub use orchestrator::{
    AnswerOutcome, AnswerSubmission, CompletionOutcome, CreatedSession, DashboardStats,
    InterviewOrchestrator, InterviewSetup,
};
pub use profile::{MemoryProfileStore, ProfileStore, StoredResume};
pub use resume::{DocumentResumeExtractor, ResumeExtractor, score_resume_or_fallback};
pub use session::{
    CasOutcome, DeleteOutcome, MemorySessionStore, SessionStore, ValkeySessionStore,
};
