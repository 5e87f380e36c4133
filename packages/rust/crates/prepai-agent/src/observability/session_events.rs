//! Stable event ids for interview and session-store log records.
//!
//! Each variant maps to one dotted id carried in the `event` field so logs can be
//! filtered without matching on message text.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    SessionCreated,
    SessionCompleted,
    SessionDeleted,
    AnswerRecorded,
    QuestionGenerated,
    QuestionAppended,
    QuestionFallbackUsed,
    ReviewGenerated,
    ReviewFallbackUsed,
    GenerationAttemptFailed,
    UpdateConflict,
    UpdateRetried,
    StoreUnavailable,
    LiveConnected,
    LiveDisconnected,
    LiveAnswerCancelled,
    ResumeExtracted,
    ResumeExtractFailed,
    ResumeScored,
    ResumeScoreFallbackUsed,
    ProfileResumeStored,
    SessionBackendEnabled,
    SessionValkeyConnected,
    SessionValkeyCommandRetrySucceeded,
    SessionValkeyCommandRetryFailed,
    SessionValkeyPipelineRetrySucceeded,
    SessionValkeyPipelineRetryFailed,
}

impl SessionEvent {
    pub const ALL: [Self; 27] = [
        Self::SessionCreated,
        Self::SessionCompleted,
        Self::SessionDeleted,
        Self::AnswerRecorded,
        Self::QuestionGenerated,
        Self::QuestionAppended,
        Self::QuestionFallbackUsed,
        Self::ReviewGenerated,
        Self::ReviewFallbackUsed,
        Self::GenerationAttemptFailed,
        Self::UpdateConflict,
        Self::UpdateRetried,
        Self::StoreUnavailable,
        Self::LiveConnected,
        Self::LiveDisconnected,
        Self::LiveAnswerCancelled,
        Self::ResumeExtracted,
        Self::ResumeExtractFailed,
        Self::ResumeScored,
        Self::ResumeScoreFallbackUsed,
        Self::ProfileResumeStored,
        Self::SessionBackendEnabled,
        Self::SessionValkeyConnected,
        Self::SessionValkeyCommandRetrySucceeded,
        Self::SessionValkeyCommandRetryFailed,
        Self::SessionValkeyPipelineRetrySucceeded,
        Self::SessionValkeyPipelineRetryFailed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionCreated => "interview.session.created",
            Self::SessionCompleted => "interview.session.completed",
            Self::SessionDeleted => "interview.session.deleted",
            Self::AnswerRecorded => "interview.answer.recorded",
            Self::QuestionGenerated => "interview.question.generated",
            Self::QuestionAppended => "interview.question.appended",
            Self::QuestionFallbackUsed => "interview.question.fallback_used",
            Self::ReviewGenerated => "interview.review.generated",
            Self::ReviewFallbackUsed => "interview.review.fallback_used",
            Self::GenerationAttemptFailed => "interview.generation.attempt_failed",
            Self::UpdateConflict => "interview.update.conflict",
            Self::UpdateRetried => "interview.update.retried",
            Self::StoreUnavailable => "interview.store.unavailable",
            Self::LiveConnected => "interview.live.connected",
            Self::LiveDisconnected => "interview.live.disconnected",
            Self::LiveAnswerCancelled => "interview.live.answer_cancelled",
            Self::ResumeExtracted => "interview.resume.extracted",
            Self::ResumeExtractFailed => "interview.resume.extract_failed",
            Self::ResumeScored => "interview.resume.scored",
            Self::ResumeScoreFallbackUsed => "interview.resume.score_fallback_used",
            Self::ProfileResumeStored => "interview.profile.resume_stored",
            Self::SessionBackendEnabled => "session.backend.enabled",
            Self::SessionValkeyConnected => "session.valkey.connected",
            Self::SessionValkeyCommandRetrySucceeded => "session.valkey.command.retry_succeeded",
            Self::SessionValkeyCommandRetryFailed => "session.valkey.command.retry_failed",
            Self::SessionValkeyPipelineRetrySucceeded => "session.valkey.pipeline.retry_succeeded",
            Self::SessionValkeyPipelineRetryFailed => "session.valkey.pipeline.retry_failed",
        }
    }
}
