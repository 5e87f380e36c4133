//! Fixed substitutes used when generation or evaluation fails.

use prepai_types::{AccuracyLevel, InterviewProfile, Question, ResumeScore, Review};

/// Generic, role-referencing opening/follow-up question.
pub fn fallback_question(profile: &InterviewProfile) -> Question {
    let role = profile.role.trim();
    let role = if role.is_empty() { "engineer" } else { role };
    let focus = profile.focus_area.trim();
    let focus = if focus.is_empty() { "your field" } else { focus };
    Question::new(
        "Technical Introduction",
        format!(
            "As a {role}, describe a challenging project you worked on recently. \
             Focus on {focus}: what problem you solved, the decisions you made, and what you would do differently."
        ),
        "text",
        "text",
    )
}

/// Neutral review recorded when the evaluator cannot score an answer.
pub fn fallback_review() -> Review {
    Review {
        technical_accuracy: Some(AccuracyLevel::Medium),
        clarity_score: Some(5),
        confidence_score: Some(5),
        feedback: "Your answer was recorded, but automatic feedback is unavailable right now. \
                   Review it against the question and continue."
            .to_string(),
    }
}

/// Neutral mid-scale result returned when the scorer cannot assess a resume.
pub fn fallback_resume_score() -> ResumeScore {
    ResumeScore {
        score: 50,
        improvement_tips: vec![
            "Lead each role with measurable outcomes.".to_string(),
            "Mirror the key skills of the target job description.".to_string(),
        ],
        summary: "Automatic resume scoring is unavailable right now; this is a neutral placeholder."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallbacks_are_well_formed() {
        let profile = InterviewProfile {
            role: "Data Scientist".to_string(),
            experience_level: "0-2 Years".to_string(),
            focus_area: "Machine Learning".to_string(),
            intensity: 3,
        };
        let question = fallback_question(&profile);
        assert!(question.is_well_formed());
        assert!(question.description.contains("Data Scientist"));
        assert!(question.description.contains("Machine Learning"));
        assert!(fallback_review().is_well_formed());
        assert!(fallback_resume_score().is_well_formed());
    }
}
