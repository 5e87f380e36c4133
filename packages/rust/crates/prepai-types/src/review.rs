use serde::{Deserialize, Serialize};

/// Upper bound of the numeric review scores (`clarity_score`, `confidence_score`).
pub const SCORE_MAX: u8 = 10;

/// Categorical technical accuracy judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyLevel {
    High,
    Medium,
    Low,
}

impl AccuracyLevel {
    /// Parse case-insensitively (`"high"`, `"HIGH"`, `" High "`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Position on the 0..=10 score scale.
    pub fn as_score(self) -> f32 {
        match self {
            Self::High => 9.0,
            Self::Medium => 6.0,
            Self::Low => 3.0,
        }
    }
}

/// Scoring payload attached to one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_accuracy: Option<AccuracyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<u8>,
    pub feedback: String,
}

impl Review {
    /// At least one score, non-empty feedback, numeric scores within range.
    pub fn is_well_formed(&self) -> bool {
        let has_score = self.technical_accuracy.is_some()
            || self.clarity_score.is_some()
            || self.confidence_score.is_some();
        let in_range = [self.clarity_score, self.confidence_score]
            .into_iter()
            .flatten()
            .all(|score| score <= SCORE_MAX);
        has_score && in_range && !self.feedback.trim().is_empty()
    }

    /// Mean of the available scores on the 0..=10 scale.
    pub fn mean_score(&self) -> Option<f32> {
        let scores: Vec<f32> = [
            self.technical_accuracy.map(AccuracyLevel::as_score),
            self.clarity_score.map(f32::from),
            self.confidence_score.map(f32::from),
        ]
        .into_iter()
        .flatten()
        .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f32>() / scores.len() as f32)
    }
}

/// Delivery metrics captured by the client while the candidate spoke.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralMetrics {
    /// Speaking pace in words per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wpm: Option<f64>,
    /// Count of filler words (um, uh, like).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filler_words: Option<u32>,
    #[serde(
        default,
        alias = "duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_secs: Option<f64>,
}
