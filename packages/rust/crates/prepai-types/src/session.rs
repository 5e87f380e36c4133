use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::question::Question;
use crate::review::{BehavioralMetrics, Review};

/// Lifecycle status of an interview session. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// Interview configuration fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewProfile {
    pub role: String,
    pub experience_level: String,
    pub focus_area: String,
    /// Interview intensity on a 1..=10 scale.
    pub intensity: u8,
}

/// One question/answer/review triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Index into `Session::questions` of the answered question.
    pub question_index: usize,
    pub question_title: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BehavioralMetrics>,
    pub review: Review,
    pub answered_at: DateTime<Utc>,
}

/// Fields supplied when persisting a fresh session; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub owner_id: String,
    pub profile: InterviewProfile,
    pub question_budget: u32,
    pub resume_context: Option<String>,
    pub opening_question: Question,
    pub created_at: DateTime<Utc>,
}

/// Persisted interview session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub owner_id: String,
    #[serde(flatten)]
    pub profile: InterviewProfile,
    /// Total questions to ask, the opening question included.
    pub question_budget: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_context: Option<String>,
    pub questions: Vec<Question>,
    pub turns: Vec<Turn>,
    pub status: SessionStatus,
    #[serde(default)]
    pub overall_score: Option<f32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Compare-and-swap revision; bumped by every persisted mutation.
    pub revision: u64,
}

impl Session {
    /// Materialize a stored record from `new` under the store-assigned `id`.
    pub fn from_new(id: impl Into<String>, new: NewSession) -> Self {
        Self {
            id: id.into(),
            owner_id: new.owner_id,
            profile: new.profile,
            question_budget: new.question_budget,
            resume_context: new.resume_context,
            questions: vec![new.opening_question],
            turns: Vec::new(),
            status: SessionStatus::Active,
            overall_score: None,
            created_at: new.created_at,
            completed_at: None,
            revision: 1,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    /// The most recently asked question that has no turn yet.
    pub fn pending_question(&self) -> Option<&Question> {
        if self.questions.len() > self.turns.len() {
            self.questions.get(self.turns.len())
        } else {
            None
        }
    }

    pub fn last_question(&self) -> Option<&Question> {
        self.questions.last()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.turns.len() >= self.question_budget as usize
    }

    /// Another question may still be appended without exceeding the budget.
    pub fn can_ask_more(&self) -> bool {
        self.questions.len() < self.question_budget as usize
    }

    /// `len(turns) <= len(questions) <= question_budget`.
    pub fn counts_consistent(&self) -> bool {
        self.turns.len() <= self.questions.len()
            && self.questions.len() <= self.question_budget as usize
    }

    /// Mean review score across turns on a 0..=100 scale, one decimal place.
    pub fn derived_score(&self) -> Option<f32> {
        let scores: Vec<f32> = self
            .turns
            .iter()
            .filter_map(|turn| turn.review.mean_score())
            .collect();
        if scores.is_empty() {
            return None;
        }
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        Some((mean * 100.0).round() / 10.0)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            role: self.profile.role.clone(),
            experience_level: self.profile.experience_level.clone(),
            focus_area: self.profile.focus_area.clone(),
            status: self.status,
            question_budget: self.question_budget,
            questions_asked: self.questions.len(),
            answers_submitted: self.turns.len(),
            overall_score: self.overall_score,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// History row for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub role: String,
    pub experience_level: String,
    pub focus_area: String,
    pub status: SessionStatus,
    pub question_budget: u32,
    pub questions_asked: usize,
    pub answers_submitted: usize,
    pub overall_score: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// What the client should do after an answer was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum NextState {
    Question(Question),
    End,
}

impl NextState {
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}
