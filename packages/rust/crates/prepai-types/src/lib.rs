//! prepai-types - Shared data model for the PrepAI interview backend
//!
//! This crate holds the interview session record and the values attached to it
//! (questions, reviews, turns, resume scores), plus the caller-facing error type. Everything here
//! is plain data with serde support so HTTP, WebSocket and store adapters can share
//! one wire shape.

#![allow(clippy::doc_markdown)]

mod error;
mod question;
mod resume;
mod review;
mod session;

pub use error::{InterviewError, InterviewResult};
pub use question::Question;
pub use resume::{RESUME_SCORE_MAX, ResumeScore};
pub use review::{AccuracyLevel, BehavioralMetrics, Review, SCORE_MAX};
pub use session::{
    InterviewProfile, NewSession, NextState, Session, SessionStatus, SessionSummary, Turn,
};
