use chrono::Utc;
use prepai_types::{
    AccuracyLevel, InterviewProfile, NewSession, NextState, Question, Review, Session,
    SessionStatus, Turn,
};
use serde_json::Value;

fn opening() -> Question {
    Question::new("Caching", "How would you cache reads?", "text", "text")
}

fn session(budget: u32) -> Session {
    Session::from_new(
        "s-1",
        NewSession {
            owner_id: "alice".to_string(),
            profile: InterviewProfile {
                role: "Backend Engineer".to_string(),
                experience_level: "3-5 Years".to_string(),
                focus_area: "Technical".to_string(),
                intensity: 3,
            },
            question_budget: budget,
            resume_context: None,
            opening_question: opening(),
            created_at: Utc::now(),
        },
    )
}

fn turn(index: usize, clarity: u8) -> Turn {
    Turn {
        question_index: index,
        question_title: "Caching".to_string(),
        answer: "I used caching.".to_string(),
        metrics: None,
        review: Review {
            technical_accuracy: Some(AccuracyLevel::High),
            clarity_score: Some(clarity),
            confidence_score: None,
            feedback: "Solid.".to_string(),
        },
        answered_at: Utc::now(),
    }
}

#[test]
fn new_session_starts_active_with_one_pending_question() {
    let s = session(3);
    assert_eq!(s.status, SessionStatus::Active);
    assert_eq!(s.revision, 1);
    assert_eq!(s.questions.len(), 1);
    assert_eq!(s.pending_question(), Some(&opening()));
    assert!(s.counts_consistent());
    assert!(s.can_ask_more());
}

#[test]
fn pending_question_clears_once_answered() {
    let mut s = session(2);
    s.turns.push(turn(0, 7));
    assert!(s.pending_question().is_none());
    assert!(!s.budget_exhausted());
    s.questions.push(Question::new("Queues", "Why queues?", "text", "text"));
    assert_eq!(s.pending_question().map(|q| q.title.as_str()), Some("Queues"));
}

#[test]
fn derived_score_scales_to_percent() {
    let mut s = session(2);
    assert_eq!(s.derived_score(), None);
    s.turns.push(turn(0, 7));
    s.questions.push(opening());
    s.turns.push(turn(1, 9));
    // turn means: (9+7)/2 = 8, (9+9)/2 = 9 -> 8.5 -> 85.0
    assert_eq!(s.derived_score(), Some(85.0));
}

#[test]
fn session_serializes_profile_flat_and_status_lowercase() {
    let s = session(2);
    let value = serde_json::to_value(&s).expect("json");
    assert_eq!(value.get("role").and_then(Value::as_str), Some("Backend Engineer"));
    assert_eq!(
        value.get("status").and_then(Value::as_str),
        Some(SessionStatus::Active.as_str())
    );
    assert_eq!(
        serde_json::to_value(SessionStatus::Completed).expect("json"),
        Value::from(SessionStatus::Completed.as_str())
    );
    let back: Session = serde_json::from_value(value).expect("roundtrip");
    assert_eq!(back, s);
}

#[test]
fn next_state_uses_type_tag() {
    let end = serde_json::to_value(NextState::End).expect("json");
    assert_eq!(end, serde_json::json!({"type": "end"}));
    let next = serde_json::to_value(NextState::Question(opening())).expect("json");
    assert_eq!(next.get("type").and_then(Value::as_str), Some("question"));
    assert_eq!(
        next.pointer("/value/title").and_then(Value::as_str),
        Some("Caching")
    );
}

#[test]
fn summary_reports_progress_counts() {
    let mut s = session(4);
    s.turns.push(turn(0, 6));
    let summary = s.summary();
    assert_eq!(summary.questions_asked, 1);
    assert_eq!(summary.answers_submitted, 1);
    assert_eq!(summary.question_budget, 4);
    assert_eq!(summary.status, SessionStatus::Active);
}
