#![allow(missing_docs)]

mod support;

use std::time::Duration;

use prepai_agent::{AnswerSubmission, GenerationError, SessionStore};
use prepai_types::{InterviewError, NextState, Question, Session, SessionStatus};

use support::{ScriptedEvaluator, ScriptedGenerator, harness, harness_with, setup, solid_review};

const OWNER: &str = "user-1";
const OTHER: &str = "user-2";

fn answer(text: &str) -> AnswerSubmission {
    AnswerSubmission {
        answer: text.to_string(),
        ..AnswerSubmission::default()
    }
}

async fn stored(store: &dyn SessionStore, session_id: &str) -> Session {
    store
        .load(session_id)
        .await
        .expect("load")
        .expect("session exists")
}

#[tokio::test]
async fn two_question_interview_runs_to_completion() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 2))
        .await
        .expect("create");
    assert_eq!(created.question.title, "Question 1");
    assert_eq!(created.question_budget, 2);

    let first = h
        .orchestrator
        .submit_answer(&created.session_id, OWNER, answer("I used caching."))
        .await
        .expect("first answer");
    assert_eq!(first.review, solid_review());
    assert_eq!(first.answers_submitted, 1);
    let NextState::Question(q2) = &first.next_state else {
        panic!("expected a follow-up question, got {:?}", first.next_state);
    };
    assert_eq!(q2.title, "Question 2");
    assert_eq!(
        h.generator.previous_seen().await,
        vec![None, Some("Question 1".to_string())]
    );

    let session = stored(&h.store, &created.session_id).await;
    assert_eq!(session.turns.len(), 1);
    assert_eq!(session.questions.len(), 2);
    assert!(session.is_active());

    let second = h
        .orchestrator
        .submit_answer(&created.session_id, OWNER, answer("I used queues."))
        .await
        .expect("second answer");
    assert_eq!(second.next_state, NextState::End);
    assert_eq!(second.answers_submitted, 2);
    assert_eq!(second.overall_score, Some(80.0));

    let session = stored(&h.store, &created.session_id).await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.turns.len(), 2);
    assert!(session.counts_consistent());
    assert!(session.completed_at.is_some());
    assert_eq!(session.turns[1].answer, "I used queues.");
}

#[tokio::test]
async fn generator_failure_still_creates_session_with_fallback_question() {
    let h = harness_with(ScriptedGenerator::failing(), ScriptedEvaluator::new());
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Data Scientist", 3))
        .await
        .expect("create despite generator failure");

    assert!(created.question.is_well_formed());
    assert_eq!(created.question.title, "Technical Introduction");
    assert!(created.question.description.contains("Data Scientist"));
    // One call plus one retry.
    assert_eq!(h.generator.calls(), 2);

    let session = stored(&h.store, &created.session_id).await;
    assert_eq!(session.questions.len(), 1);
    assert_eq!(session.status, SessionStatus::Active);
}

#[tokio::test]
async fn malformed_question_is_retried_once_before_falling_back() {
    let generator = ScriptedGenerator::with_script(vec![
        Err(GenerationError::Malformed("invalid JSON".to_string())),
        Ok(Question::new("Load Balancing", "Explain L4 vs L7.", "text", "text")),
    ]);
    let h = harness_with(generator, ScriptedEvaluator::new());
    let created = h
        .orchestrator
        .create_session(OWNER, setup("SRE", 2))
        .await
        .expect("create");
    assert_eq!(created.question.title, "Load Balancing");
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test]
async fn evaluator_failure_records_turn_with_neutral_review() {
    let h = harness_with(ScriptedGenerator::new(), ScriptedEvaluator::failing());
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 3))
        .await
        .expect("create");
    let outcome = h
        .orchestrator
        .submit_answer(&created.session_id, OWNER, answer("Sharding by tenant."))
        .await
        .expect("submit");
    assert!(outcome.review.is_well_formed());
    assert_eq!(outcome.review.clarity_score, Some(5));
    assert_eq!(h.evaluator.calls(), 2);
    assert_eq!(stored(&h.store, &created.session_id).await.turns.len(), 1);
}

#[tokio::test]
async fn question_budget_outside_range_is_rejected() {
    let h = harness();
    for budget in [0, -3, 11] {
        let err = h
            .orchestrator
            .create_session(OWNER, setup("Backend Engineer", budget))
            .await
            .expect_err("budget out of range");
        assert_eq!(err.kind(), "invalid_request", "budget {budget}");
    }
    assert!(h.store.is_empty().await);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn omitted_budget_uses_configured_default() {
    let h = harness();
    let mut request = setup("Backend Engineer", 1);
    request.question_budget = None;
    let created = h
        .orchestrator
        .create_session(OWNER, request)
        .await
        .expect("create");
    assert_eq!(created.question_budget, 5);
}

#[tokio::test]
async fn blank_answer_is_invalid_and_not_recorded() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 2))
        .await
        .expect("create");
    let err = h
        .orchestrator
        .submit_answer(&created.session_id, OWNER, answer("   \n"))
        .await
        .expect_err("blank answer");
    assert_eq!(err.kind(), "invalid_request");
    assert_eq!(h.evaluator.calls(), 0);
    assert!(stored(&h.store, &created.session_id).await.turns.is_empty());
}

#[tokio::test]
async fn submit_on_completed_session_conflicts_without_mutation() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 1))
        .await
        .expect("create");
    let outcome = h
        .orchestrator
        .submit_answer(&created.session_id, OWNER, answer("Consistent hashing."))
        .await
        .expect("submit");
    assert!(outcome.next_state.is_end());

    let before = stored(&h.store, &created.session_id).await;
    let err = h
        .orchestrator
        .submit_answer(&created.session_id, OWNER, answer("One more thing."))
        .await
        .expect_err("completed");
    assert_eq!(err.kind(), "conflict");
    assert_eq!(stored(&h.store, &created.session_id).await, before);
}

#[tokio::test]
async fn non_owner_is_forbidden_and_nothing_changes() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 2))
        .await
        .expect("create");
    let before = stored(&h.store, &created.session_id).await;

    let err = h
        .orchestrator
        .submit_answer(&created.session_id, OTHER, answer("Not my session."))
        .await
        .expect_err("forbidden");
    assert!(matches!(err, InterviewError::Forbidden(_)));
    assert_eq!(
        h.orchestrator
            .get_next_question(&created.session_id, OTHER)
            .await
            .expect_err("forbidden")
            .kind(),
        "forbidden"
    );
    assert_eq!(
        h.orchestrator
            .complete_session(&created.session_id, OTHER, None)
            .await
            .expect_err("forbidden")
            .kind(),
        "forbidden"
    );
    assert_eq!(stored(&h.store, &created.session_id).await, before);
    assert_eq!(h.evaluator.calls(), 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let h = harness();
    let err = h
        .orchestrator
        .submit_answer("missing", OWNER, answer("Hello."))
        .await
        .expect_err("not found");
    assert_eq!(err.kind(), "not_found");
    let err = h
        .orchestrator
        .delete_session("missing", OWNER)
        .await
        .expect_err("not found");
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn stale_question_title_conflicts() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 3))
        .await
        .expect("create");
    let err = h
        .orchestrator
        .submit_answer(
            &created.session_id,
            OWNER,
            AnswerSubmission {
                answer: "An answer.".to_string(),
                question_title: Some("Some Older Question".to_string()),
                metrics: None,
            },
        )
        .await
        .expect_err("stale title");
    assert_eq!(err.kind(), "conflict");

    let ok = h
        .orchestrator
        .submit_answer(
            &created.session_id,
            OWNER,
            AnswerSubmission {
                answer: "An answer.".to_string(),
                question_title: Some(created.question.title.clone()),
                metrics: None,
            },
        )
        .await
        .expect("matching title");
    assert_eq!(ok.answers_submitted, 1);
}

#[tokio::test]
async fn next_question_returns_pending_question_without_generating() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 3))
        .await
        .expect("create");
    let calls = h.generator.calls();
    for _ in 0..2 {
        let question = h
            .orchestrator
            .get_next_question(&created.session_id, OWNER)
            .await
            .expect("pending");
        assert_eq!(question, created.question);
    }
    assert_eq!(h.generator.calls(), calls);
}

#[tokio::test]
async fn next_question_on_completed_session_conflicts() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 2))
        .await
        .expect("create");
    h.orchestrator
        .complete_session(&created.session_id, OWNER, None)
        .await
        .expect("complete");
    let err = h
        .orchestrator
        .get_next_question(&created.session_id, OWNER)
        .await
        .expect_err("completed");
    assert_eq!(err.kind(), "conflict");
}

#[tokio::test]
async fn concurrent_duplicate_submissions_record_one_turn() {
    let h = harness_with(
        ScriptedGenerator::new(),
        ScriptedEvaluator::slow(Duration::from_millis(50)),
    );
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 3))
        .await
        .expect("create");

    let (a, b) = tokio::join!(
        h.orchestrator
            .submit_answer(&created.session_id, OWNER, answer("First copy.")),
        h.orchestrator
            .submit_answer(&created.session_id, OWNER, answer("Second copy.")),
    );
    let results = [a, b];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one submission wins: {results:?}");
    let loser = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one loser");
    assert_eq!(loser.kind(), "conflict");

    let session = stored(&h.store, &created.session_id).await;
    assert_eq!(session.turns.len(), 1);
    assert!(session.counts_consistent());
}

#[tokio::test]
async fn dropped_submission_leaves_session_unchanged() {
    let h = harness_with(
        ScriptedGenerator::new(),
        ScriptedEvaluator::slow(Duration::from_millis(300)),
    );
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 2))
        .await
        .expect("create");
    let before = stored(&h.store, &created.session_id).await;

    let timed_out = tokio::time::timeout(
        Duration::from_millis(20),
        h.orchestrator
            .submit_answer(&created.session_id, OWNER, answer("Cut off mid-way.")),
    )
    .await;
    assert!(timed_out.is_err(), "submission should have been cancelled");
    assert_eq!(stored(&h.store, &created.session_id).await, before);
}

#[tokio::test]
async fn complete_is_idempotent_and_keeps_first_score() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 3))
        .await
        .expect("create");

    let first = h
        .orchestrator
        .complete_session(&created.session_id, OWNER, Some(72.5))
        .await
        .expect("complete");
    assert_eq!(first.status, SessionStatus::Completed);
    assert_eq!(first.overall_score, Some(72.5));
    assert!(!first.already_completed);

    let revision = stored(&h.store, &created.session_id).await.revision;
    let second = h
        .orchestrator
        .complete_session(&created.session_id, OWNER, Some(10.0))
        .await
        .expect("complete again");
    assert!(second.already_completed);
    assert_eq!(second.overall_score, Some(72.5));
    assert_eq!(stored(&h.store, &created.session_id).await.revision, revision);
}

#[tokio::test]
async fn complete_derives_score_from_turns_and_rejects_bad_client_score() {
    let h = harness();
    let created = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 3))
        .await
        .expect("create");
    h.orchestrator
        .submit_answer(&created.session_id, OWNER, answer("Write-ahead logs."))
        .await
        .expect("submit");

    for bad in [150.0, -1.0, f64::NAN] {
        let err = h
            .orchestrator
            .complete_session(&created.session_id, OWNER, Some(bad))
            .await
            .expect_err("bad score");
        assert_eq!(err.kind(), "invalid_request");
    }
    let outcome = h
        .orchestrator
        .complete_session(&created.session_id, OWNER, None)
        .await
        .expect("complete");
    assert_eq!(outcome.overall_score, Some(80.0));
}

#[tokio::test]
async fn delete_respects_ownership_and_updates_history() {
    let h = harness();
    let mine = h
        .orchestrator
        .create_session(OWNER, setup("Backend Engineer", 2))
        .await
        .expect("create");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = h
        .orchestrator
        .create_session(OWNER, setup("Frontend Engineer", 2))
        .await
        .expect("create");
    h.orchestrator
        .create_session(OTHER, setup("Designer", 2))
        .await
        .expect("create");

    let history = h.orchestrator.get_history(OWNER).await.expect("history");
    let ids: Vec<&str> = history.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec![newer.session_id.as_str(), mine.session_id.as_str()]);

    let err = h
        .orchestrator
        .delete_session(&mine.session_id, OTHER)
        .await
        .expect_err("forbidden");
    assert_eq!(err.kind(), "forbidden");
    assert!(h.store.load(&mine.session_id).await.expect("load").is_some());

    h.orchestrator
        .delete_session(&mine.session_id, OWNER)
        .await
        .expect("delete");
    assert!(h.store.load(&mine.session_id).await.expect("load").is_none());
    let history = h.orchestrator.get_history(OWNER).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].session_id, newer.session_id);
}

#[tokio::test]
async fn dashboard_averages_completed_scored_sessions() {
    let h = harness();
    let empty = h.orchestrator.dashboard_stats(OWNER).await.expect("stats");
    assert_eq!((empty.interviews, empty.completed), (0, 0));
    assert!(empty.avg_score.abs() < f32::EPSILON);

    for score in [60.0, 90.0] {
        let created = h
            .orchestrator
            .create_session(OWNER, setup("Backend Engineer", 2))
            .await
            .expect("create");
        h.orchestrator
            .complete_session(&created.session_id, OWNER, Some(score))
            .await
            .expect("complete");
    }
    h.orchestrator
        .create_session(OWNER, setup("Backend Engineer", 2))
        .await
        .expect("create active");

    let stats = h.orchestrator.dashboard_stats(OWNER).await.expect("stats");
    assert_eq!(stats.interviews, 3);
    assert_eq!(stats.completed, 2);
    assert!((stats.avg_score - 75.0).abs() < 0.01);
}

#[tokio::test]
async fn resume_context_is_trimmed_and_truncated() {
    let h = harness();
    let mut request = setup("Backend Engineer", 2);
    request.resume_context = Some(format!("  {}  ", "r".repeat(4000)));
    let created = h
        .orchestrator
        .create_session(OWNER, request)
        .await
        .expect("create");
    let session = stored(&h.store, &created.session_id).await;
    let resume = session.resume_context.expect("resume stored");
    assert_eq!(resume.chars().count(), 2500);
    assert!(resume.starts_with('r'));
}
