//! Live interview socket tests against a real listener on 127.0.0.1:0.

#![allow(missing_docs)]

mod support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use prepai_agent::{
    DocumentResumeExtractor, GatewayState, HmacIdentityProvider, IdentityProvider,
    MemoryProfileStore, MemorySessionStore, ServerConfig, SessionStore, router,
};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use support::{
    Harness, ScriptedEvaluator, ScriptedGenerator, ScriptedResumeScorer, harness, harness_with,
    setup,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct LiveServer {
    addr: SocketAddr,
    token: String,
    store: MemorySessionStore,
    session_id: String,
}

async fn start(h: Harness, budget: i64) -> LiveServer {
    let identity = HmacIdentityProvider::new("live-test-secret", 3600).expect("identity");
    let token = identity.issue("alice").expect("token");
    let created = h
        .orchestrator
        .create_session("alice", setup("Backend Engineer", budget))
        .await
        .expect("create");
    let state = GatewayState::new(
        h.orchestrator.clone(),
        Arc::new(identity),
        Arc::new(DocumentResumeExtractor),
        Arc::new(ScriptedResumeScorer::new()),
        Arc::new(MemoryProfileStore::new()),
        &ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            request_timeout_secs: 30,
            max_concurrent_requests: None,
            max_upload_bytes: 1024,
        },
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });
    LiveServer {
        addr,
        token,
        store: h.store,
        session_id: created.session_id,
    }
}

async fn connect(server: &LiveServer) -> Socket {
    let url = format!(
        "ws://{}/api/interview/live/{}?token={}",
        server.addr, server.session_id, server.token
    );
    let (socket, _) = connect_async(url).await.expect("connect");
    socket
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("message before timeout")
            .expect("socket open")
            .expect("frame");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}

async fn send_json(socket: &mut Socket, value: &Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

#[tokio::test]
async fn live_answer_gets_analysis_then_next_question() {
    let server = start(harness(), 3).await;
    let mut socket = connect(&server).await;

    let opening = next_json(&mut socket).await;
    assert_eq!(opening["type"], "question");
    assert_eq!(opening["question"]["title"], "Question 1");

    send_json(
        &mut socket,
        &json!({"type": "user_answer_finished", "content": "I used caching.", "metrics": {"wpm": 120}}),
    )
    .await;
    assert_eq!(next_json(&mut socket).await["content"], "analyzing");
    let analysis = next_json(&mut socket).await;
    assert_eq!(analysis["type"], "analysis");
    assert_eq!(analysis["review"]["clarity_score"], 8);
    let follow_up = next_json(&mut socket).await;
    assert_eq!(follow_up["type"], "question");
    assert_eq!(follow_up["question"]["title"], "Question 2");

    send_json(
        &mut socket,
        &json!({"type": "end_interview", "overall_score": 55}),
    )
    .await;
    let end = next_json(&mut socket).await;
    assert_eq!(end["type"], "end");
    assert_eq!(end["overall_score"], 55.0);

    let session = server
        .store
        .load(&server.session_id)
        .await
        .expect("load")
        .expect("session");
    assert!(!session.is_active());
    assert_eq!(session.turns.len(), 1);
}

#[tokio::test]
async fn last_answer_ends_the_live_interview() {
    let server = start(harness(), 1).await;
    let mut socket = connect(&server).await;
    assert_eq!(next_json(&mut socket).await["type"], "question");

    send_json(
        &mut socket,
        &json!({"type": "user_answer_finished", "content": "Consistent hashing."}),
    )
    .await;
    assert_eq!(next_json(&mut socket).await["type"], "status");
    assert_eq!(next_json(&mut socket).await["type"], "analysis");
    let end = next_json(&mut socket).await;
    assert_eq!(end["type"], "end");
    assert_eq!(end["overall_score"], 80.0);
}

#[tokio::test]
async fn messages_during_analysis_get_busy_status() {
    let server = start(
        harness_with(
            ScriptedGenerator::new(),
            ScriptedEvaluator::slow(Duration::from_millis(300)),
        ),
        3,
    )
    .await;
    let mut socket = connect(&server).await;
    next_json(&mut socket).await;

    send_json(
        &mut socket,
        &json!({"type": "user_answer_finished", "content": "First answer."}),
    )
    .await;
    assert_eq!(next_json(&mut socket).await["content"], "analyzing");
    send_json(
        &mut socket,
        &json!({"type": "user_answer_finished", "content": "Impatient second answer."}),
    )
    .await;
    let busy = next_json(&mut socket).await;
    assert_eq!(busy["type"], "status");
    assert_eq!(busy["content"], "busy");
    assert_eq!(next_json(&mut socket).await["type"], "analysis");
    assert_eq!(next_json(&mut socket).await["type"], "question");

    let session = server
        .store
        .load(&server.session_id)
        .await
        .expect("load")
        .expect("session");
    assert_eq!(session.turns.len(), 1);
}

#[tokio::test]
async fn disconnect_during_analysis_records_nothing() {
    let server = start(
        harness_with(
            ScriptedGenerator::new(),
            ScriptedEvaluator::slow(Duration::from_millis(400)),
        ),
        3,
    )
    .await;
    let mut socket = connect(&server).await;
    next_json(&mut socket).await;

    send_json(
        &mut socket,
        &json!({"type": "user_answer_finished", "content": "Leaving mid-answer."}),
    )
    .await;
    assert_eq!(next_json(&mut socket).await["content"], "analyzing");
    socket.close(None).await.expect("close");

    tokio::time::sleep(Duration::from_millis(700)).await;
    let session = server
        .store
        .load(&server.session_id)
        .await
        .expect("load")
        .expect("session");
    assert!(session.turns.is_empty());
    assert!(session.is_active());
}

#[tokio::test]
async fn invalid_token_is_rejected_before_upgrade() {
    let server = start(harness(), 2).await;
    let url = format!(
        "ws://{}/api/interview/live/{}?token=not-a-token",
        server.addr, server.session_id
    );
    assert!(connect_async(url).await.is_err());
}
