//! Live interview socket: `/api/interview/live/{session_id}`.
//!
//! Client: `{type: user_answer_finished, content, metrics?, question_title?}` or
//! `{type: end_interview, overall_score?}`. Server: `question`, `status`,
//! `analysis`, `end`, `error`. One answer is analysed at a time; a close frame
//! during analysis drops the in-flight submission.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use prepai_types::{BehavioralMetrics, InterviewResult, NextState, Question, Review};

use crate::observability::SessionEvent;
use crate::orchestrator::{AnswerOutcome, AnswerSubmission};

use super::auth::{authenticate, bearer_token};
use super::error::ApiError;
use super::http::{GatewayState, validate_session_id};

#[derive(Debug, Deserialize)]
pub(crate) struct LiveQuery {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    UserAnswerFinished {
        content: String,
        #[serde(default)]
        metrics: Option<BehavioralMetrics>,
        #[serde(default)]
        question_title: Option<String>,
    },
    EndInterview {
        #[serde(default)]
        overall_score: Option<f64>,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Question { question: Question },
    Status { content: &'static str },
    Analysis { review: Review },
    End { overall_score: Option<f32> },
    Error { kind: &'static str, message: String },
}

impl From<&ApiError> for ServerMessage {
    fn from(error: &ApiError) -> Self {
        Self::Error {
            kind: error.kind(),
            message: error.message(),
        }
    }
}

/// Authenticate (header or `?token=`), check ownership, then upgrade.
pub(crate) async fn handle_live(
    State(state): State<GatewayState>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    query: Result<Query<LiveQuery>, QueryRejection>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let Path(session_id) = path?;
    let Query(query) = query?;
    let token = bearer_token(&headers).or_else(|| {
        query
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    });
    let identity = authenticate(&state, token)?;
    let session_id = validate_session_id(&session_id)?;
    let ws = ws?;
    state
        .orchestrator
        .get_session(&session_id, &identity.user_id)
        .await?;
    let user_id = identity.user_id;
    Ok(ws.on_upgrade(move |socket| run_live(socket, state, session_id, user_id)))
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    let Ok(text) = serde_json::to_string(message) else {
        return false;
    };
    socket.send(Message::Text(text.into())).await.is_ok()
}

enum AnalysisWait {
    Finished(Result<AnswerOutcome, ApiError>),
    Incoming(Option<Result<Message, axum::Error>>),
}

/// Opening message: the pending question, or `end` for a closed session.
async fn open(socket: &mut WebSocket, state: &GatewayState, session_id: &str, user_id: &str) -> bool {
    let session: InterviewResult<_> = state.orchestrator.get_session(session_id, user_id).await;
    let message = match session {
        Ok(session) if !session.is_active() => {
            send(
                socket,
                &ServerMessage::End {
                    overall_score: session.overall_score,
                },
            )
            .await;
            return false;
        }
        Ok(_) => match state
            .bounded(
                "live_open",
                state.orchestrator.get_next_question(session_id, user_id),
            )
            .await
        {
            Ok(question) => ServerMessage::Question { question },
            Err(error) => {
                send(socket, &ServerMessage::from(&error)).await;
                return false;
            }
        },
        Err(error) => {
            send(socket, &ServerMessage::from(&ApiError::from(error))).await;
            return false;
        }
    };
    send(socket, &message).await
}

async fn run_live(mut socket: WebSocket, state: GatewayState, session_id: String, user_id: String) {
    tracing::info!(
        event = SessionEvent::LiveConnected.as_str(),
        session_id = %session_id,
        user_id = %user_id,
        "live interview socket connected"
    );
    if open(&mut socket, &state, &session_id, &user_id).await {
        serve_messages(&mut socket, &state, &session_id, &user_id).await;
    }
    let _ = socket.send(Message::Close(None)).await;
    tracing::info!(
        event = SessionEvent::LiveDisconnected.as_str(),
        session_id = %session_id,
        "live interview socket closed"
    );
}

async fn serve_messages(
    socket: &mut WebSocket,
    state: &GatewayState,
    session_id: &str,
    user_id: &str,
) {
    while let Some(incoming) = socket.recv().await {
        let text = match incoming {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return,
            Ok(_) => continue,
            Err(error) => {
                tracing::debug!(session_id, error = %error, "live socket receive failed");
                return;
            }
        };
        let parsed = match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(parsed) => parsed,
            Err(error) => {
                let error = ApiError::invalid(format!("unrecognised message: {error}"));
                if !send(socket, &ServerMessage::from(&error)).await {
                    return;
                }
                continue;
            }
        };

        match parsed {
            ClientMessage::UserAnswerFinished {
                content,
                metrics,
                question_title,
            } => {
                if !send(socket, &ServerMessage::Status { content: "analyzing" }).await {
                    return;
                }
                let submission = AnswerSubmission {
                    answer: content,
                    question_title,
                    metrics,
                };
                let Some(result) = analyse(socket, state, session_id, user_id, submission).await
                else {
                    tracing::info!(
                        event = SessionEvent::LiveAnswerCancelled.as_str(),
                        session_id,
                        "client left during analysis; submission dropped"
                    );
                    return;
                };
                match result {
                    Ok(outcome) => {
                        if !send(socket, &ServerMessage::Analysis {
                            review: outcome.review,
                        })
                        .await
                        {
                            return;
                        }
                        match outcome.next_state {
                            NextState::Question(question) => {
                                if !send(socket, &ServerMessage::Question { question }).await {
                                    return;
                                }
                            }
                            NextState::End => {
                                send(socket, &ServerMessage::End {
                                    overall_score: outcome.overall_score,
                                })
                                .await;
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        if !send(socket, &ServerMessage::from(&error)).await {
                            return;
                        }
                    }
                }
            }
            ClientMessage::EndInterview { overall_score } => {
                match state
                    .orchestrator
                    .complete_session(session_id, user_id, overall_score)
                    .await
                {
                    Ok(outcome) => {
                        send(socket, &ServerMessage::End {
                            overall_score: outcome.overall_score,
                        })
                        .await;
                        return;
                    }
                    Err(error) => {
                        if !send(socket, &ServerMessage::from(&ApiError::from(error))).await {
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Drive one submission while answering other traffic with `busy`.
///
/// `None` when the client went away; the submission future is dropped with it.
async fn analyse(
    socket: &mut WebSocket,
    state: &GatewayState,
    session_id: &str,
    user_id: &str,
    submission: AnswerSubmission,
) -> Option<Result<AnswerOutcome, ApiError>> {
    let submit = state.bounded(
        "live_submit",
        state
            .orchestrator
            .submit_answer(session_id, user_id, submission),
    );
    tokio::pin!(submit);
    loop {
        let wait = tokio::select! {
            result = &mut submit => AnalysisWait::Finished(result),
            incoming = socket.recv() => AnalysisWait::Incoming(incoming),
        };
        match wait {
            AnalysisWait::Finished(result) => return Some(result),
            AnalysisWait::Incoming(None | Some(Err(_)) | Some(Ok(Message::Close(_)))) => {
                return None;
            }
            AnalysisWait::Incoming(Some(Ok(Message::Text(_)))) => {
                if !send(socket, &ServerMessage::Status { content: "busy" }).await {
                    return None;
                }
            }
            AnalysisWait::Incoming(Some(Ok(_))) => {}
        }
    }
}
