//! Deterministic interviewer fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use prepai_agent::{
    AnswerEvaluator, EvaluationRequest, GenerationError, InterviewOrchestrator, InterviewPolicy,
    InterviewSetup, MemorySessionStore, QuestionGenerator, QuestionRequest, ResumeScoreRequest,
    ResumeScorer,
};
use prepai_types::{AccuracyLevel, Question, ResumeScore, Review};
use tokio::sync::Mutex;

/// Replays scripted replies, then numbers fresh questions ("Question 1", "Question 2", ...).
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<Question, GenerationError>>>,
    always_fail: bool,
    calls: AtomicUsize,
    previous_seen: Mutex<Vec<Option<String>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn with_script(script: Vec<Result<Question, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn previous_seen(&self) -> Vec<Option<String>> {
        self.previous_seen.lock().await.clone()
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate_question(
        &self,
        request: QuestionRequest<'_>,
    ) -> Result<Question, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.previous_seen
            .lock()
            .await
            .push(request.previous_question.map(str::to_string));
        if self.always_fail {
            return Err(GenerationError::Unavailable("connection refused".to_string()));
        }
        if let Some(next) = self.script.lock().await.pop_front() {
            return next;
        }
        Ok(Question::new(
            format!("Question {call}"),
            format!("Tell me about {} topic {call}.", request.profile.focus_area),
            "text",
            "text",
        ))
    }
}

pub fn solid_review() -> Review {
    Review {
        technical_accuracy: Some(AccuracyLevel::High),
        clarity_score: Some(8),
        confidence_score: Some(7),
        feedback: "Clear structure and correct reasoning.".to_string(),
    }
}

/// Always returns `solid_review()` unless told to fail; optional delay per call.
#[derive(Default)]
pub struct ScriptedEvaluator {
    always_fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerEvaluator for ScriptedEvaluator {
    async fn evaluate_answer(
        &self,
        _request: EvaluationRequest<'_>,
    ) -> Result<Review, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.always_fail {
            return Err(GenerationError::Malformed("invalid JSON".to_string()));
        }
        Ok(solid_review())
    }
}

/// Scores every resume 82 unless told to fail; records the job descriptions it saw.
#[derive(Default)]
pub struct ScriptedResumeScorer {
    always_fail: bool,
    calls: AtomicUsize,
    jobs_seen: std::sync::Mutex<Vec<String>>,
}

impl ScriptedResumeScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn jobs_seen(&self) -> Vec<String> {
        self.jobs_seen.lock().expect("jobs lock").clone()
    }
}

#[async_trait]
impl ResumeScorer for ScriptedResumeScorer {
    async fn score_resume(
        &self,
        request: ResumeScoreRequest<'_>,
    ) -> Result<ResumeScore, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.jobs_seen
            .lock()
            .expect("jobs lock")
            .push(request.job_description.to_string());
        if self.always_fail {
            return Err(GenerationError::Unavailable("connection refused".to_string()));
        }
        Ok(ResumeScore {
            score: 82,
            improvement_tips: vec!["Quantify the latency wins.".to_string()],
            summary: "Solid backend profile.".to_string(),
        })
    }
}

pub struct Harness {
    pub store: MemorySessionStore,
    pub generator: Arc<ScriptedGenerator>,
    pub evaluator: Arc<ScriptedEvaluator>,
    pub orchestrator: Arc<InterviewOrchestrator>,
}

pub fn harness_with(generator: ScriptedGenerator, evaluator: ScriptedEvaluator) -> Harness {
    let store = MemorySessionStore::new();
    let generator = Arc::new(generator);
    let evaluator = Arc::new(evaluator);
    let orchestrator = Arc::new(InterviewOrchestrator::new(
        Arc::new(store.clone()),
        generator.clone(),
        evaluator.clone(),
        InterviewPolicy::default(),
    ));
    Harness {
        store,
        generator,
        evaluator,
        orchestrator,
    }
}

pub fn harness() -> Harness {
    harness_with(ScriptedGenerator::new(), ScriptedEvaluator::new())
}

pub fn setup(role: &str, budget: i64) -> InterviewSetup {
    InterviewSetup {
        role: Some(role.to_string()),
        experience_level: Some("3-5 Years".to_string()),
        focus_area: Some("System Design".to_string()),
        intensity: Some(5),
        question_budget: Some(budget),
        resume_context: None,
    }
}
