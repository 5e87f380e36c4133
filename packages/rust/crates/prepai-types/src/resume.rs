use serde::{Deserialize, Serialize};

/// Upper bound of the ATS-style resume score.
pub const RESUME_SCORE_MAX: u8 = 100;

/// ATS-style assessment of a resume against a job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeScore {
    /// 0..=100.
    pub score: u8,
    #[serde(default)]
    pub improvement_tips: Vec<String>,
    pub summary: String,
}

impl ResumeScore {
    /// Score in range and a non-empty summary; blank tips are not allowed.
    pub fn is_well_formed(&self) -> bool {
        self.score <= RESUME_SCORE_MAX
            && !self.summary.trim().is_empty()
            && self.improvement_tips.iter().all(|tip| !tip.trim().is_empty())
    }
}
