//! HTTP gateway: `/api` interview routes, coding challenges, resume extraction and
//! scoring, profile resume storage, dashboard, health.
//!
//! Bearer auth on every route except health. LLM-bound routes (initiate, submit,
//! next, resume score, live answers) share a per-request timeout and an optional
//! concurrency limit; dropping the request future cancels the in-flight generation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use prepai_types::{
    BehavioralMetrics, InterviewError, InterviewResult, Question, ResumeScore, Session,
    SessionStatus, SessionSummary,
};

use crate::config::ServerConfig;
use crate::identity::IdentityProvider;
use crate::interviewer::{
    CodingChallenge, DsaDifficulty, ResumeScoreRequest, ResumeScorer, coding_challenge,
    coding_challenges, dsa_question,
};
use crate::observability::SessionEvent;
use crate::orchestrator::{
    AnswerOutcome, AnswerSubmission, DashboardStats, InterviewOrchestrator, InterviewSetup,
};
use crate::profile::{ProfileStore, StoredResume};
use crate::resume::{ResumeExtractor, score_resume_or_fallback};
use crate::session::store_failure;

use super::auth::AuthenticatedUser;
use super::error::ApiError;
use super::live::handle_live;

/// Shared state: orchestrator, identity, resume and profile adapters, request limits.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<InterviewOrchestrator>,
    pub identity: Arc<dyn IdentityProvider>,
    pub resume: Arc<dyn ResumeExtractor>,
    pub resume_scorer: Arc<dyn ResumeScorer>,
    pub profiles: Arc<dyn ProfileStore>,
    pub request_timeout_secs: u64,
    /// When Some, limits concurrent LLM-bound requests; excess requests wait for a slot.
    pub concurrency_semaphore: Option<Arc<Semaphore>>,
    pub max_concurrent_requests: Option<usize>,
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub fn new(
        orchestrator: Arc<InterviewOrchestrator>,
        identity: Arc<dyn IdentityProvider>,
        resume: Arc<dyn ResumeExtractor>,
        resume_scorer: Arc<dyn ResumeScorer>,
        profiles: Arc<dyn ProfileStore>,
        server: &ServerConfig,
    ) -> Self {
        Self {
            orchestrator,
            identity,
            resume,
            resume_scorer,
            profiles,
            request_timeout_secs: server.request_timeout_secs,
            concurrency_semaphore: server
                .max_concurrent_requests
                .map(|n| Arc::new(Semaphore::new(n))),
            max_concurrent_requests: server.max_concurrent_requests,
            max_upload_bytes: server.max_upload_bytes,
        }
    }

    /// Run an LLM-bound operation under the concurrency limit and request timeout.
    pub(crate) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = InterviewResult<T>>,
    {
        let _permit = if let Some(ref sem) = self.concurrency_semaphore {
            Some(sem.acquire().await.map_err(|_| ApiError::Overloaded)?)
        } else {
            None
        };
        let timeout_secs = self.request_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(timeout_secs), fut).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => {
                tracing::warn!(operation, timeout_secs, "request timed out; work cancelled");
                Err(ApiError::Timeout(timeout_secs))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GatewayHealthResponse {
    pub status: &'static str,
    pub store_backend: &'static str,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_requests: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_flight_requests: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "experience_level")]
    pub experience: Option<String>,
    #[serde(default, alias = "focus_area")]
    pub focus: Option<String>,
    #[serde(default)]
    pub intensity: Option<i64>,
    #[serde(default)]
    pub question_budget: Option<i64>,
    #[serde(default)]
    pub resume_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub session_id: String,
    pub question: Question,
    pub question_budget: u32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub session_id: String,
    #[serde(alias = "code")]
    pub answer: String,
    #[serde(default)]
    pub question_title: Option<String>,
    #[serde(default)]
    pub metrics: Option<BehavioralMetrics>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: AnswerOutcome,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct NextQuestionResponse {
    pub session_id: String,
    pub question: Question,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub session_id: String,
    #[serde(default)]
    pub overall_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub status: SessionStatus,
    pub overall_score: Option<f32>,
    pub already_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct DsaQuery {
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeExtractResponse {
    pub filename: String,
    pub extracted_text: String,
    pub characters: usize,
}

#[derive(Debug, Serialize)]
pub struct ResumeScoreResponse {
    #[serde(flatten)]
    pub score: ResumeScore,
    pub extracted_text: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResumeUploadResponse {
    pub success: bool,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResumeResponse {
    pub resume_filename: String,
    /// Raw file bytes, standard base64.
    pub resume_data: String,
    pub size_bytes: usize,
    pub resume_updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: String,
    pub stats: DashboardStats,
}

/// Trimmed, non-empty session id.
pub fn validate_session_id(raw: &str) -> Result<String, ApiError> {
    let session_id = raw.trim();
    if session_id.is_empty() {
        return Err(ApiError::invalid("session_id must be non-empty"));
    }
    Ok(session_id.to_string())
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// The file field plus the requested text fields of one multipart upload.
struct UploadForm {
    file: Option<UploadedFile>,
    text_fields: HashMap<String, String>,
}

impl UploadForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.text_fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn require_file(self) -> Result<UploadedFile, ApiError> {
        self.file
            .ok_or_else(|| ApiError::invalid("no resume uploaded"))
    }
}

/// Read `file_field` (first one wins) and the named text fields; other fields are skipped.
async fn read_upload_form(
    mut multipart: Multipart,
    file_field: &str,
    text_fields: &[&str],
) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        file: None,
        text_fields: HashMap::new(),
    };
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == file_field && form.file.is_none() {
            let filename = field
                .file_name()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ApiError::invalid("resume upload has no filename"))?;
            let bytes = field.bytes().await?;
            form.file = Some(UploadedFile {
                filename,
                bytes: bytes.to_vec(),
            });
        } else if text_fields.contains(&name.as_str()) {
            let value = field.text().await?;
            form.text_fields.insert(name, value);
        }
    }
    Ok(form)
}

async fn handle_health(State(state): State<GatewayState>) -> Json<GatewayHealthResponse> {
    let in_flight_requests = state.max_concurrent_requests.and_then(|max| {
        state
            .concurrency_semaphore
            .as_ref()
            .map(|sem| max.saturating_sub(sem.available_permits()))
    });
    Json(GatewayHealthResponse {
        status: "healthy",
        store_backend: state.orchestrator.store_backend(),
        request_timeout_secs: state.request_timeout_secs,
        max_concurrent_requests: state.max_concurrent_requests,
        in_flight_requests,
    })
}

async fn handle_initiate(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    payload: Result<Json<InitiateRequest>, JsonRejection>,
) -> Result<Json<InitiateResponse>, ApiError> {
    let Json(body) = payload?;
    let setup = InterviewSetup {
        role: body.role,
        experience_level: body.experience,
        focus_area: body.focus,
        intensity: body.intensity,
        question_budget: body.question_budget,
        resume_context: body.resume_context,
    };
    let created = state
        .bounded(
            "initiate",
            state.orchestrator.create_session(user.user_id(), setup),
        )
        .await?;
    Ok(Json(InitiateResponse {
        session_id: created.session_id,
        question: created.question,
        question_budget: created.question_budget,
    }))
}

async fn handle_submit(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(body) = payload?;
    let session_id = validate_session_id(&body.session_id)?;
    let submission = AnswerSubmission {
        answer: body.answer,
        question_title: body.question_title,
        metrics: body.metrics,
    };
    let outcome = state
        .bounded(
            "submit",
            state
                .orchestrator
                .submit_answer(&session_id, user.user_id(), submission),
        )
        .await?;
    Ok(Json(SubmitResponse {
        success: true,
        outcome,
    }))
}

async fn handle_next(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<NextQuestionResponse>, ApiError> {
    let Json(body) = payload?;
    let session_id = validate_session_id(&body.session_id)?;
    let question = state
        .bounded(
            "next_question",
            state
                .orchestrator
                .get_next_question(&session_id, user.user_id()),
        )
        .await?;
    Ok(Json(NextQuestionResponse {
        session_id,
        question,
    }))
}

async fn handle_complete(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let Json(body) = payload?;
    let session_id = validate_session_id(&body.session_id)?;
    let outcome = state
        .orchestrator
        .complete_session(&session_id, user.user_id(), body.overall_score)
        .await?;
    Ok(Json(CompleteResponse {
        success: true,
        status: outcome.status,
        overall_score: outcome.overall_score,
        already_completed: outcome.already_completed,
    }))
}

async fn handle_history(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
) -> Result<Json<HistoryResponse>, ApiError> {
    let sessions = state.orchestrator.get_history(user.user_id()).await?;
    Ok(Json(HistoryResponse { sessions }))
}

async fn handle_session(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Session>, ApiError> {
    let Path(session_id) = path?;
    let session_id = validate_session_id(&session_id)?;
    let session = state
        .orchestrator
        .get_session(&session_id, user.user_id())
        .await?;
    Ok(Json(session))
}

async fn handle_delete(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(session_id) = path?;
    let session_id = validate_session_id(&session_id)?;
    state
        .orchestrator
        .delete_session(&session_id, user.user_id())
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn handle_dsa(
    _user: AuthenticatedUser,
    query: Result<Query<DsaQuery>, QueryRejection>,
) -> Result<Json<Question>, ApiError> {
    let Query(query) = query?;
    Ok(Json(dsa_question(DsaDifficulty::parse(
        query.difficulty.as_deref(),
    ))))
}

async fn handle_resume_extract(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResumeExtractResponse>, ApiError> {
    let file = read_upload_form(multipart?, "resume", &[])
        .await?
        .require_file()?;
    tracing::debug!(
        user_id = user.user_id(),
        filename = %file.filename,
        bytes = file.bytes.len(),
        "resume upload received"
    );
    let extracted_text = state.resume.extract_text(&file.filename, file.bytes).await;
    let characters = extracted_text.chars().count();
    Ok(Json(ResumeExtractResponse {
        filename: file.filename,
        extracted_text,
        characters,
    }))
}

async fn handle_resume_score(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResumeScoreResponse>, ApiError> {
    let form = read_upload_form(multipart?, "resume", &["job_description"]).await?;
    let job_description = form.text("job_description").unwrap_or("General").to_string();
    let file = form.require_file()?;
    let extracted_text = state.resume.extract_text(&file.filename, file.bytes).await;
    if extracted_text.trim().is_empty() {
        return Err(ApiError::invalid("could not extract text from the resume"));
    }
    tracing::debug!(
        user_id = user.user_id(),
        filename = %file.filename,
        characters = extracted_text.chars().count(),
        "resume score requested"
    );
    let attempts = state.orchestrator.policy().generation_attempts;
    let request = ResumeScoreRequest {
        resume_text: &extracted_text,
        job_description: &job_description,
    };
    let scorer = state.resume_scorer.as_ref();
    let score = state
        .bounded("resume_score", async {
            Ok::<_, InterviewError>(score_resume_or_fallback(scorer, request, attempts).await)
        })
        .await?;
    Ok(Json(ResumeScoreResponse {
        score,
        extracted_text,
    }))
}

async fn handle_coding_challenges(_user: AuthenticatedUser) -> Json<&'static [CodingChallenge]> {
    Json(coding_challenges())
}

async fn handle_coding_challenge(
    _user: AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<&'static CodingChallenge>, ApiError> {
    let Path(challenge_id) = path?;
    Ok(Json(coding_challenge(challenge_id.trim())?))
}

async fn handle_profile_resume_upload(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProfileResumeUploadResponse>, ApiError> {
    let file = read_upload_form(multipart?, "resume", &[])
        .await?
        .require_file()?;
    if file.bytes.is_empty() {
        return Err(ApiError::invalid("resume upload is empty"));
    }
    let size_bytes = file.bytes.len();
    let stored = StoredResume {
        filename: file.filename.clone(),
        data_base64: STANDARD.encode(&file.bytes),
        size_bytes,
        updated_at: Utc::now(),
    };
    state
        .profiles
        .put_resume(user.user_id(), stored)
        .await
        .map_err(|error| store_failure("put_profile_resume", None, &error))?;
    tracing::info!(
        event = SessionEvent::ProfileResumeStored.as_str(),
        user_id = user.user_id(),
        filename = %file.filename,
        bytes = size_bytes,
        backend = state.profiles.backend_name(),
        "profile resume stored"
    );
    Ok(Json(ProfileResumeUploadResponse {
        success: true,
        filename: file.filename,
    }))
}

async fn handle_profile_resume_get(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
) -> Result<Json<ProfileResumeResponse>, ApiError> {
    let stored = state
        .profiles
        .get_resume(user.user_id())
        .await
        .map_err(|error| store_failure("get_profile_resume", None, &error))?
        .ok_or_else(|| InterviewError::NotFound("no resume stored for this user".to_string()))?;
    Ok(Json(ProfileResumeResponse {
        resume_filename: stored.filename,
        resume_data: stored.data_base64,
        size_bytes: stored.size_bytes,
        resume_updated_at: stored.updated_at,
    }))
}

async fn handle_dashboard(
    State(state): State<GatewayState>,
    user: AuthenticatedUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let stats = state.orchestrator.dashboard_stats(user.user_id()).await?;
    Ok(Json(DashboardResponse {
        user: user.user_id().to_string(),
        stats,
    }))
}

/// Build the gateway router; all routes live under `/api`.
pub fn router(state: GatewayState) -> Router {
    let upload_limit = state.max_upload_bytes;
    let interview = Router::new()
        .route("/initiate", post(handle_initiate))
        .route("/submit", post(handle_submit))
        .route("/next", post(handle_next))
        .route("/next-question", post(handle_next))
        .route("/complete", post(handle_complete))
        .route("/history", get(handle_history))
        .route("/session/{session_id}", get(handle_session))
        .route("/delete/{session_id}", delete(handle_delete))
        .route("/dsa", get(handle_dsa))
        .route("/live/{session_id}", get(handle_live));
    let coding = Router::new()
        .route("/challenges", get(handle_coding_challenges))
        .route("/challenge/{challenge_id}", get(handle_coding_challenge));
    let resume = Router::new()
        .route("/extract", post(handle_resume_extract))
        .route("/score", post(handle_resume_score))
        .layer(DefaultBodyLimit::max(upload_limit));
    let profile = Router::new()
        .route(
            "/resume/upload",
            post(handle_profile_resume_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/resume/get", get(handle_profile_resume_get));
    let api = Router::new()
        .route("/health", get(handle_health))
        .nest("/interview", interview)
        .nest("/coding", coding)
        .nest("/resume", resume)
        .nest("/profile", profile)
        .route("/dashboard", get(handle_dashboard));
    Router::new().nest("/api", api).with_state(state)
}

/// Run the HTTP server on `bind_addr` (e.g. `0.0.0.0:5000`).
/// Graceful shutdown on Ctrl+C (SIGINT) and SIGTERM (Unix); in-flight requests complete before exit.
pub async fn run_http(state: GatewayState, bind_addr: &str) -> Result<()> {
    let timeout = state.request_timeout_secs;
    let max_str = state
        .max_concurrent_requests
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unlimited".to_string());
    let backend = state.orchestrator.store_backend();
    let app = router(state);
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(
        "gateway listening on {} (store={}, request_timeout={}s, max_concurrent={}, Ctrl+C/SIGTERM to stop)",
        bind_addr,
        backend,
        timeout,
        max_str
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let ctrl_c = tokio::signal::ctrl_c();
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to listen for SIGTERM; Ctrl+C only");
                let _ = ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
