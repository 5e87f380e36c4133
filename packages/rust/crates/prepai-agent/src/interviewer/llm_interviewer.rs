//! Chat-completions backed question generator and answer evaluator.

use async_trait::async_trait;

use prepai_types::{Question, ResumeScore, Review};

use crate::llm::{ChatMessage, LlmClient};

use super::parsing::{parse_question, parse_resume_score, parse_review};
use super::prompts::{
    ATS_SYSTEM_PROMPT, SYSTEM_PROMPT, evaluation_prompt, question_prompt, resume_score_prompt,
};
use super::{
    AnswerEvaluator, EvaluationRequest, GenerationError, QuestionGenerator, QuestionRequest,
    ResumeScoreRequest, ResumeScorer,
};

/// One LLM client serving the interviewer roles and resume scoring.
pub struct LlmInterviewer {
    llm: LlmClient,
}

impl LlmInterviewer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn ask(&self, system: &str, prompt: String) -> Result<String, GenerationError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(prompt)];
        self.llm
            .complete_json(&messages)
            .await
            .map_err(|error| GenerationError::Unavailable(format!("{error:#}")))
    }
}

#[async_trait]
impl QuestionGenerator for LlmInterviewer {
    async fn generate_question(
        &self,
        request: QuestionRequest<'_>,
    ) -> Result<Question, GenerationError> {
        let content = self.ask(SYSTEM_PROMPT, question_prompt(&request)).await?;
        let question = parse_question(&content)?;
        tracing::debug!(
            model = %self.llm.model(),
            title = %question.title,
            follow_up = request.previous_question.is_some(),
            "llm question parsed"
        );
        Ok(question)
    }
}

#[async_trait]
impl AnswerEvaluator for LlmInterviewer {
    async fn evaluate_answer(
        &self,
        request: EvaluationRequest<'_>,
    ) -> Result<Review, GenerationError> {
        let content = self.ask(SYSTEM_PROMPT, evaluation_prompt(&request)).await?;
        let review = parse_review(&content)?;
        tracing::debug!(
            model = %self.llm.model(),
            question = %request.question.title,
            clarity = ?review.clarity_score,
            confidence = ?review.confidence_score,
            "llm review parsed"
        );
        Ok(review)
    }
}

#[async_trait]
impl ResumeScorer for LlmInterviewer {
    async fn score_resume(
        &self,
        request: ResumeScoreRequest<'_>,
    ) -> Result<ResumeScore, GenerationError> {
        let content = self
            .ask(ATS_SYSTEM_PROMPT, resume_score_prompt(&request))
            .await?;
        let score = parse_resume_score(&content)?;
        tracing::debug!(
            model = %self.llm.model(),
            score = score.score,
            tips = score.improvement_tips.len(),
            "llm resume score parsed"
        );
        Ok(score)
    }
}
