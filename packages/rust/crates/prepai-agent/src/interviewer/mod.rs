//! Interviewer namespace: question generation, answer evaluation and resume scoring seams.
//!
//! The orchestrator only sees the first two traits below. `LlmInterviewer` is the
//! chat-completions adapter; callers that need determinism (tests, offline demos)
//! plug in their own implementations.

mod challenges;
mod dsa;
mod fallback;
mod llm_interviewer;
mod parsing;
mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use prepai_types::{BehavioralMetrics, InterviewProfile, Question, ResumeScore, Review};

pub use challenges::{CodingChallenge, coding_challenge, coding_challenges};
pub use dsa::{DsaDifficulty, dsa_question};
pub use fallback::{fallback_question, fallback_resume_score, fallback_review};
pub use llm_interviewer::LlmInterviewer;
pub use parsing::{parse_question, parse_resume_score, parse_review};
pub use prompts::truncate_chars;

/// Generator or evaluator failure. Never surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Backend unreachable, timed out, or answered with an error status.
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    /// Backend answered but the payload is not a usable structured value.
    #[error("malformed generator output: {0}")]
    Malformed(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "upstream_unavailable",
            Self::Malformed(_) => "malformed_upstream_response",
        }
    }
}

/// Inputs for one question generation call.
#[derive(Debug, Clone, Copy)]
pub struct QuestionRequest<'a> {
    pub profile: &'a InterviewProfile,
    pub resume_context: Option<&'a str>,
    /// Title of the question just answered; `None` for the opening question.
    pub previous_question: Option<&'a str>,
}

/// Inputs for one answer evaluation call.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    pub profile: &'a InterviewProfile,
    pub question: &'a Question,
    pub answer: &'a str,
    pub metrics: Option<&'a BehavioralMetrics>,
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_question(
        &self,
        request: QuestionRequest<'_>,
    ) -> Result<Question, GenerationError>;
}

#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    async fn evaluate_answer(&self, request: EvaluationRequest<'_>)
    -> Result<Review, GenerationError>;
}

/// Inputs for one ATS-style resume assessment.
#[derive(Debug, Clone, Copy)]
pub struct ResumeScoreRequest<'a> {
    pub resume_text: &'a str,
    /// Target role or job posting; `"General"` when the client sent none.
    pub job_description: &'a str,
}

#[async_trait]
pub trait ResumeScorer: Send + Sync {
    async fn score_resume(
        &self,
        request: ResumeScoreRequest<'_>,
    ) -> Result<ResumeScore, GenerationError>;
}
