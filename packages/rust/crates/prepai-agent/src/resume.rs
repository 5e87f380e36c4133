//! Resume text extraction and ATS-style scoring for the `/api/resume/*` routes.

use async_trait::async_trait;

use prepai_types::ResumeScore;

use crate::interviewer::{ResumeScoreRequest, ResumeScorer, fallback_resume_score};
use crate::observability::SessionEvent;

/// Opaque text extractor: an empty string means nothing usable was found.
#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    async fn extract_text(&self, filename: &str, bytes: Vec<u8>) -> String;
}

/// PDF via `pdf-extract` on a blocking thread; `.txt`/`.md` passed through as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentResumeExtractor;

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
}

fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ResumeExtractor for DocumentResumeExtractor {
    async fn extract_text(&self, filename: &str, bytes: Vec<u8>) -> String {
        let byte_len = bytes.len();
        let text = match extension(filename).as_deref() {
            Some("txt" | "md") => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(
                        event = SessionEvent::ResumeExtractFailed.as_str(),
                        filename,
                        error = %error,
                        "resume upload is not valid utf-8"
                    );
                    return String::new();
                }
            },
            Some("pdf") => {
                // A malformed PDF can panic inside the parser; the join error absorbs it.
                let extracted =
                    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                        .await;
                match extracted {
                    Ok(Ok(text)) => text,
                    Ok(Err(error)) => {
                        tracing::warn!(
                            event = SessionEvent::ResumeExtractFailed.as_str(),
                            filename,
                            error = %error,
                            "pdf text extraction failed"
                        );
                        return String::new();
                    }
                    Err(error) => {
                        tracing::warn!(
                            event = SessionEvent::ResumeExtractFailed.as_str(),
                            filename,
                            error = %error,
                            "pdf text extraction aborted"
                        );
                        return String::new();
                    }
                }
            }
            other => {
                tracing::warn!(
                    event = SessionEvent::ResumeExtractFailed.as_str(),
                    filename,
                    extension = ?other,
                    "unsupported resume file type"
                );
                return String::new();
            }
        };
        let text = normalize_whitespace(&text);
        tracing::info!(
            event = SessionEvent::ResumeExtracted.as_str(),
            filename,
            bytes = byte_len,
            characters = text.chars().count(),
            "resume text extracted"
        );
        text
    }
}

/// Score a resume with up to `attempts` scorer calls, then fall back to a neutral score.
pub async fn score_resume_or_fallback(
    scorer: &dyn ResumeScorer,
    request: ResumeScoreRequest<'_>,
    attempts: u32,
) -> ResumeScore {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match scorer.score_resume(request).await {
            Ok(score) if score.is_well_formed() => {
                tracing::info!(
                    event = SessionEvent::ResumeScored.as_str(),
                    attempt,
                    score = score.score,
                    "resume scored"
                );
                return score;
            }
            Ok(_) => {
                tracing::warn!(
                    event = SessionEvent::GenerationAttemptFailed.as_str(),
                    stage = "resume_score",
                    attempt,
                    kind = "malformed_upstream_response",
                    "resume score is out of range or lacks a summary"
                );
            }
            Err(error) => {
                tracing::warn!(
                    event = SessionEvent::GenerationAttemptFailed.as_str(),
                    stage = "resume_score",
                    attempt,
                    kind = error.kind(),
                    error = %error,
                    "resume scoring attempt failed"
                );
            }
        }
    }
    tracing::warn!(
        event = SessionEvent::ResumeScoreFallbackUsed.as_str(),
        attempts,
        "using fallback resume score"
    );
    fallback_resume_score()
}
