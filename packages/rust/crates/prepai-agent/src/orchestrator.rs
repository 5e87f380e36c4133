//! Interview session orchestrator.
//!
//! Owns the session state machine (`active` → `completed`) on top of three seams:
//! a [`SessionStore`], a [`QuestionGenerator`] and an [`AnswerEvaluator`]. Every
//! mutation goes through `update_session` (re-read, validate, compare-and-swap);
//! generator and evaluator calls always finish before the write they feed.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use prepai_types::{
    BehavioralMetrics, InterviewError, InterviewProfile, InterviewResult, NewSession, NextState,
    Question, Review, Session, SessionStatus, SessionSummary, Turn,
};

use crate::config::InterviewPolicy;
use crate::interviewer::{
    AnswerEvaluator, EvaluationRequest, QuestionGenerator, QuestionRequest, fallback_question,
    fallback_review, truncate_chars,
};
use crate::observability::SessionEvent;
use crate::session::{
    DeleteOutcome, SessionStore, UpdateOutcome, load_owned, store_failure, update_session,
};

const DEFAULT_ROLE: &str = "Software Engineer";
const DEFAULT_EXPERIENCE: &str = "0-2 Years";
const DEFAULT_FOCUS: &str = "Technical";
const DEFAULT_INTENSITY: u8 = 3;

/// Client-supplied interview configuration; every field is optional.
#[derive(Debug, Clone, Default)]
pub struct InterviewSetup {
    pub role: Option<String>,
    pub experience_level: Option<String>,
    pub focus_area: Option<String>,
    pub intensity: Option<i64>,
    pub question_budget: Option<i64>,
    pub resume_context: Option<String>,
}

/// A freshly created session and its opening question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub question: Question,
    pub question_budget: u32,
}

/// One answer as sent by the client.
#[derive(Debug, Clone, Default)]
pub struct AnswerSubmission {
    pub answer: String,
    /// Title of the question the client believes it is answering.
    pub question_title: Option<String>,
    pub metrics: Option<BehavioralMetrics>,
}

/// Review of a recorded answer and what the client should show next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub review: Review,
    pub next_state: NextState,
    pub answers_submitted: usize,
    pub question_budget: u32,
    /// Set once the answer closed the session.
    pub overall_score: Option<f32>,
}

/// Final state reported by `complete_session`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub status: SessionStatus,
    pub overall_score: Option<f32>,
    /// The session was already completed; nothing was written.
    pub already_completed: bool,
}

/// Aggregate numbers for the dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub interviews: usize,
    pub completed: usize,
    /// Mean overall score of completed, scored sessions; 0 when there are none.
    pub avg_score: f32,
}

/// Drives interview sessions over an injected store, generator and evaluator.
pub struct InterviewOrchestrator {
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn QuestionGenerator>,
    evaluator: Arc<dyn AnswerEvaluator>,
    policy: InterviewPolicy,
}

impl InterviewOrchestrator {
    /// Wire the orchestrator to its collaborators.
    pub fn new(
        store: Arc<dyn SessionStore>,
        generator: Arc<dyn QuestionGenerator>,
        evaluator: Arc<dyn AnswerEvaluator>,
        policy: InterviewPolicy,
    ) -> Self {
        Self {
            store,
            generator,
            evaluator,
            policy,
        }
    }

    /// Budget and retry limits in effect.
    pub fn policy(&self) -> &InterviewPolicy {
        &self.policy
    }

    /// Label of the session store backend.
    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Start a session and return its opening question.
    pub async fn create_session(
        &self,
        owner_id: &str,
        setup: InterviewSetup,
    ) -> InterviewResult<CreatedSession> {
        let question_budget = self.resolve_budget(setup.question_budget)?;
        let profile = normalize_profile(&setup);
        let resume_context = setup
            .resume_context
            .as_deref()
            .map(|text| truncate_chars(text.trim(), self.policy.resume_context_chars))
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let question = self
            .question_or_fallback(QuestionRequest {
                profile: &profile,
                resume_context: resume_context.as_deref(),
                previous_question: None,
            })
            .await;

        let session = self
            .store
            .insert(NewSession {
                owner_id: owner_id.to_string(),
                profile,
                question_budget,
                resume_context,
                opening_question: question.clone(),
                created_at: Utc::now(),
            })
            .await
            .map_err(|error| store_failure("insert", None, &error))?;

        tracing::info!(
            event = SessionEvent::SessionCreated.as_str(),
            session_id = %session.id,
            owner_id,
            role = %session.profile.role,
            question_budget,
            backend = self.store.backend_name(),
            "interview session created"
        );
        Ok(CreatedSession {
            session_id: session.id,
            question,
            question_budget,
        })
    }

    /// Record an answer to the pending question, then either close the session
    /// (budget reached) or append the next question.
    pub async fn submit_answer(
        &self,
        session_id: &str,
        owner_id: &str,
        submission: AnswerSubmission,
    ) -> InterviewResult<AnswerOutcome> {
        let answer = submission.answer.trim();
        if answer.is_empty() {
            return Err(InterviewError::InvalidRequest(
                "answer must be non-empty".to_string(),
            ));
        }

        let session = load_owned(self.store.as_ref(), session_id, owner_id).await?;
        if !session.is_active() {
            return Err(InterviewError::session_completed(session_id));
        }
        let Some(pending) = session.pending_question().cloned() else {
            return Err(InterviewError::Conflict(format!(
                "session {session_id} has no pending question; request the next question first"
            )));
        };
        if let Some(claimed) = submission
            .question_title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            && claimed != pending.title.trim()
        {
            return Err(InterviewError::Conflict(format!(
                "answer targets \"{claimed}\" but the pending question is \"{}\"",
                pending.title
            )));
        }

        let observed_turns = session.turns.len();
        let observed_questions = session.questions.len();
        let review = self
            .review_or_fallback(EvaluationRequest {
                profile: &session.profile,
                question: &pending,
                answer,
                metrics: submission.metrics.as_ref(),
            })
            .await;

        let turn = Turn {
            question_index: observed_turns,
            question_title: pending.title.clone(),
            answer: answer.to_string(),
            metrics: submission.metrics,
            review: review.clone(),
            answered_at: Utc::now(),
        };
        let outcome = update_session(
            self.store.as_ref(),
            session_id,
            owner_id,
            "submit_answer",
            |current| {
                if !current.is_active()
                    || current.turns.len() != observed_turns
                    || current.questions.len() != observed_questions
                {
                    return None;
                }
                let mut next = current.clone();
                next.turns.push(turn.clone());
                if next.budget_exhausted() {
                    next.status = SessionStatus::Completed;
                    next.completed_at = Some(Utc::now());
                    next.overall_score = next.derived_score();
                }
                Some(next)
            },
        )
        .await?;

        let stored = match outcome {
            UpdateOutcome::Applied(stored) => stored,
            UpdateOutcome::Rejected(current) if !current.is_active() => {
                return Err(InterviewError::session_completed(session_id));
            }
            UpdateOutcome::Rejected(_) => {
                return Err(InterviewError::Conflict(format!(
                    "an answer to \"{}\" was already recorded",
                    pending.title
                )));
            }
        };
        tracing::info!(
            event = SessionEvent::AnswerRecorded.as_str(),
            session_id,
            question_index = observed_turns,
            answers_submitted = stored.turns.len(),
            question_budget = stored.question_budget,
            "answer recorded"
        );

        let answers_submitted = stored.turns.len();
        let question_budget = stored.question_budget;
        let overall_score = stored.overall_score;
        let next_state = if stored.is_active() {
            match self.append_next_question(stored, owner_id).await? {
                Some(question) => NextState::Question(question),
                None => NextState::End,
            }
        } else {
            tracing::info!(
                event = SessionEvent::SessionCompleted.as_str(),
                session_id,
                overall_score = ?stored.overall_score,
                status = stored.status.as_str(),
                reason = "budget_reached",
                "interview session completed"
            );
            NextState::End
        };

        Ok(AnswerOutcome {
            review,
            next_state,
            answers_submitted,
            question_budget,
            overall_score,
        })
    }

    /// Pending question if one exists, else generate and append one.
    pub async fn get_next_question(
        &self,
        session_id: &str,
        owner_id: &str,
    ) -> InterviewResult<Question> {
        let session = load_owned(self.store.as_ref(), session_id, owner_id).await?;
        if !session.is_active() {
            return Err(InterviewError::session_completed(session_id));
        }
        self.append_next_question(session, owner_id)
            .await?
            .ok_or_else(|| InterviewError::session_completed(session_id))
    }

    /// Close the session. Completing a completed session is a no-op success.
    pub async fn complete_session(
        &self,
        session_id: &str,
        owner_id: &str,
        overall_score: Option<f64>,
    ) -> InterviewResult<CompletionOutcome> {
        let client_score = match overall_score {
            None => None,
            Some(score) if score.is_finite() && (0.0..=100.0).contains(&score) => {
                // Bounded to 0..=100 above.
                #[allow(clippy::cast_possible_truncation)]
                let score = score as f32;
                Some(score)
            }
            Some(score) => {
                return Err(InterviewError::InvalidRequest(format!(
                    "overall_score must be within 0..=100, got {score}"
                )));
            }
        };

        let outcome = update_session(
            self.store.as_ref(),
            session_id,
            owner_id,
            "complete_session",
            |current| {
                if !current.is_active() {
                    return None;
                }
                let mut next = current.clone();
                next.status = SessionStatus::Completed;
                next.completed_at = Some(Utc::now());
                next.overall_score = client_score.or_else(|| current.derived_score());
                Some(next)
            },
        )
        .await?;

        Ok(match outcome {
            UpdateOutcome::Applied(stored) => {
                tracing::info!(
                    event = SessionEvent::SessionCompleted.as_str(),
                    session_id,
                    overall_score = ?stored.overall_score,
                    answers_submitted = stored.turns.len(),
                    status = stored.status.as_str(),
                    reason = "client_request",
                    "interview session completed"
                );
                CompletionOutcome {
                    status: stored.status,
                    overall_score: stored.overall_score,
                    already_completed: false,
                }
            }
            UpdateOutcome::Rejected(current) => CompletionOutcome {
                status: current.status,
                overall_score: current.overall_score,
                already_completed: true,
            },
        })
    }

    /// Owner's sessions, most recently created first.
    pub async fn get_history(&self, owner_id: &str) -> InterviewResult<Vec<SessionSummary>> {
        let mut sessions = self
            .store
            .list_by_owner(owner_id)
            .await
            .map_err(|error| store_failure("list_by_owner", None, &error))?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions.iter().map(Session::summary).collect())
    }

    /// Owner-checked full session record.
    pub async fn get_session(&self, session_id: &str, owner_id: &str) -> InterviewResult<Session> {
        load_owned(self.store.as_ref(), session_id, owner_id).await
    }

    /// Delete an owned session.
    pub async fn delete_session(&self, session_id: &str, owner_id: &str) -> InterviewResult<()> {
        let outcome = self
            .store
            .delete_owned(session_id, owner_id)
            .await
            .map_err(|error| store_failure("delete", Some(session_id), &error))?;
        match outcome {
            DeleteOutcome::Deleted => {
                tracing::info!(
                    event = SessionEvent::SessionDeleted.as_str(),
                    session_id,
                    owner_id,
                    "interview session deleted"
                );
                Ok(())
            }
            DeleteOutcome::NotFound => Err(InterviewError::session_not_found(session_id)),
            DeleteOutcome::Forbidden => Err(InterviewError::session_forbidden(session_id)),
        }
    }

    /// Session counts and mean score across the owner's history.
    pub async fn dashboard_stats(&self, owner_id: &str) -> InterviewResult<DashboardStats> {
        let history = self.get_history(owner_id).await?;
        let completed = history
            .iter()
            .filter(|summary| summary.status == SessionStatus::Completed)
            .count();
        let scores: Vec<f32> = history
            .iter()
            .filter(|summary| summary.status == SessionStatus::Completed)
            .filter_map(|summary| summary.overall_score)
            .collect();
        let avg_score = if scores.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let mean = scores.iter().sum::<f32>() / scores.len() as f32;
            (mean * 10.0).round() / 10.0
        };
        Ok(DashboardStats {
            interviews: history.len(),
            completed,
            avg_score,
        })
    }

    fn resolve_budget(&self, requested: Option<i64>) -> InterviewResult<u32> {
        let max = self.policy.max_question_budget;
        let Some(requested) = requested else {
            return Ok(self.policy.default_question_budget);
        };
        u32::try_from(requested)
            .ok()
            .filter(|budget| (1..=max).contains(budget))
            .ok_or_else(|| {
                InterviewError::InvalidRequest(format!(
                    "question_budget must be within 1..={max}, got {requested}"
                ))
            })
    }

    /// Append one generated question to `snapshot`'s session.
    ///
    /// Returns the pending question when one already exists (including one a
    /// concurrent request just appended) and `None` once the session is closed.
    async fn append_next_question(
        &self,
        snapshot: Session,
        owner_id: &str,
    ) -> InterviewResult<Option<Question>> {
        if let Some(pending) = snapshot.pending_question() {
            return Ok(Some(pending.clone()));
        }
        if !snapshot.is_active() || !snapshot.can_ask_more() {
            return Ok(None);
        }

        let previous = snapshot.last_question().map(|q| q.title.clone());
        let question = self
            .question_or_fallback(QuestionRequest {
                profile: &snapshot.profile,
                resume_context: snapshot.resume_context.as_deref(),
                previous_question: previous.as_deref(),
            })
            .await;

        let observed_turns = snapshot.turns.len();
        let observed_questions = snapshot.questions.len();
        let outcome = update_session(
            self.store.as_ref(),
            &snapshot.id,
            owner_id,
            "append_question",
            |current| {
                if !current.is_active()
                    || current.turns.len() != observed_turns
                    || current.questions.len() != observed_questions
                    || !current.can_ask_more()
                {
                    return None;
                }
                let mut next = current.clone();
                next.questions.push(question.clone());
                Some(next)
            },
        )
        .await?;

        match outcome {
            UpdateOutcome::Applied(stored) => {
                tracing::debug!(
                    event = SessionEvent::QuestionAppended.as_str(),
                    session_id = %stored.id,
                    questions_asked = stored.questions.len(),
                    question_budget = stored.question_budget,
                    title = %question.title,
                    "next question appended"
                );
                Ok(Some(question))
            }
            UpdateOutcome::Rejected(current) if !current.is_active() => Ok(None),
            UpdateOutcome::Rejected(current) => {
                current.pending_question().cloned().map(Some).ok_or_else(|| {
                    InterviewError::Conflict(format!(
                        "session {} changed while the next question was generated; retry",
                        current.id
                    ))
                })
            }
        }
    }

    async fn question_or_fallback(&self, request: QuestionRequest<'_>) -> Question {
        let attempts = self.policy.generation_attempts.max(1);
        for attempt in 1..=attempts {
            match self.generator.generate_question(request).await {
                Ok(question) if question.is_well_formed() => {
                    tracing::debug!(
                        event = SessionEvent::QuestionGenerated.as_str(),
                        attempt,
                        follow_up = request.previous_question.is_some(),
                        title = %question.title,
                        "question generated"
                    );
                    return question;
                }
                Ok(_) => {
                    tracing::warn!(
                        event = SessionEvent::GenerationAttemptFailed.as_str(),
                        stage = "question",
                        attempt,
                        kind = "malformed_upstream_response",
                        "generated question lacks a title or description"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        event = SessionEvent::GenerationAttemptFailed.as_str(),
                        stage = "question",
                        attempt,
                        kind = error.kind(),
                        error = %error,
                        "question generation attempt failed"
                    );
                }
            }
        }
        tracing::warn!(
            event = SessionEvent::QuestionFallbackUsed.as_str(),
            attempts,
            role = %request.profile.role,
            "using fallback question"
        );
        fallback_question(request.profile)
    }

    async fn review_or_fallback(&self, request: EvaluationRequest<'_>) -> Review {
        let attempts = self.policy.generation_attempts.max(1);
        for attempt in 1..=attempts {
            match self.evaluator.evaluate_answer(request).await {
                Ok(review) if review.is_well_formed() => {
                    tracing::debug!(
                        event = SessionEvent::ReviewGenerated.as_str(),
                        attempt,
                        question = %request.question.title,
                        "answer reviewed"
                    );
                    return review;
                }
                Ok(_) => {
                    tracing::warn!(
                        event = SessionEvent::GenerationAttemptFailed.as_str(),
                        stage = "review",
                        attempt,
                        kind = "malformed_upstream_response",
                        "review carries no usable score or feedback"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        event = SessionEvent::GenerationAttemptFailed.as_str(),
                        stage = "review",
                        attempt,
                        kind = error.kind(),
                        error = %error,
                        "answer evaluation attempt failed"
                    );
                }
            }
        }
        tracing::warn!(
            event = SessionEvent::ReviewFallbackUsed.as_str(),
            attempts,
            question = %request.question.title,
            "using fallback review"
        );
        fallback_review()
    }
}

fn text_or(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn normalize_profile(setup: &InterviewSetup) -> InterviewProfile {
    let intensity = setup
        .intensity
        .map(|v| v.clamp(1, 10))
        .and_then(|v| u8::try_from(v).ok())
        .unwrap_or(DEFAULT_INTENSITY);
    InterviewProfile {
        role: text_or(setup.role.as_deref(), DEFAULT_ROLE),
        experience_level: text_or(setup.experience_level.as_deref(), DEFAULT_EXPERIENCE),
        focus_area: text_or(setup.focus_area.as_deref(), DEFAULT_FOCUS),
        intensity,
    }
}
