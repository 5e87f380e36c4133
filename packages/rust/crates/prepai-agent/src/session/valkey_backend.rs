//! Redis/Valkey-backed session store for multi-instance deployments.
//!
//! Layout per session: a hash `{prefix}:record:{id}` with fields `revision`,
//! `owner` and `record` (JSON), plus a set `{prefix}:owner:{owner_id}` indexing
//! the owner's session ids. Conditional writes and owned deletes run as Lua
//! scripts so each one is a single atomic step on the server. With a TTL, every
//! write refreshes both the record and its owner index, so the index never
//! expires before a record it lists. Profile resumes live under
//! `{prefix}:profile:{user_id}:resume` as JSON and never expire.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::FromRedisValue;
use tokio::sync::Mutex;

use prepai_types::{NewSession, Session};

use crate::observability::SessionEvent;
use crate::profile::{ProfileStore, StoredResume};

use super::store::{CasOutcome, DeleteOutcome, SessionStore};

const DEFAULT_SESSION_KEY_PREFIX: &str = "prepai:session";

const COMPARE_AND_SWAP_SCRIPT: &str = r#"
local current = redis.call("HGET", KEYS[1], "revision")
if not current then
  return -1
end
if current ~= ARGV[1] then
  return 0
end
redis.call("HSET", KEYS[1], "revision", ARGV[2], "record", ARGV[3])
local ttl = tonumber(ARGV[4]) or 0
if ttl > 0 then
  redis.call("EXPIRE", KEYS[1], ttl)
  redis.call("EXPIRE", KEYS[2], ttl)
end
return 1
"#;

const DELETE_OWNED_SCRIPT: &str = r#"
local owner = redis.call("HGET", KEYS[1], "owner")
if not owner then
  return -1
end
if owner ~= ARGV[1] then
  return 0
end
redis.call("DEL", KEYS[1])
redis.call("SREM", KEYS[2], ARGV[2])
return 1
"#;

#[derive(Debug)]
pub struct ValkeySessionStore {
    client: redis::Client,
    key_prefix: String,
    ttl_secs: Option<u64>,
    connection: Arc<Mutex<Option<redis::aio::MultiplexedConnection>>>,
}

impl ValkeySessionStore {
    pub fn new(
        url: impl Into<String>,
        key_prefix: Option<String>,
        ttl_secs: Option<u64>,
    ) -> Result<Self> {
        let url = url.into();
        let client = redis::Client::open(url.as_str())
            .with_context(|| format!("invalid redis url for session backend: {url}"))?;
        let key_prefix = key_prefix
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_KEY_PREFIX.to_string());
        let ttl_secs = ttl_secs.filter(|value| *value > 0);
        tracing::info!(
            event = SessionEvent::SessionBackendEnabled.as_str(),
            key_prefix = %key_prefix,
            ttl_secs = ?ttl_secs,
            "session store backend enabled: valkey"
        );
        Ok(Self {
            client,
            key_prefix,
            ttl_secs,
            connection: Arc::new(Mutex::new(None)),
        })
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn record_key(&self, session_id: &str) -> String {
        format!("{}:record:{}", self.key_prefix, session_id)
    }

    fn owner_index_key(&self, owner_id: &str) -> String {
        format!("{}:owner:{}", self.key_prefix, owner_id)
    }

    fn profile_resume_key(&self, user_id: &str) -> String {
        format!("{}:profile:{}:resume", self.key_prefix, user_id)
    }

    async fn ensure_connection(
        &self,
        connection: &mut Option<redis::aio::MultiplexedConnection>,
    ) -> Result<()> {
        if connection.is_some() {
            return Ok(());
        }
        *connection = Some(
            self.client
                .get_multiplexed_async_connection()
                .await
                .context("failed to open redis connection for session backend")?,
        );
        tracing::debug!(
            event = SessionEvent::SessionValkeyConnected.as_str(),
            key_prefix = %self.key_prefix,
            "valkey session backend connected"
        );
        Ok(())
    }

    /// Run one command; on failure drop the connection, reconnect and try once more.
    async fn run_command<T, F>(&self, operation: &'static str, build: F) -> Result<T>
    where
        T: FromRedisValue + Send,
        F: Fn() -> redis::Cmd,
    {
        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..2 {
            let mut conn_guard = self.connection.lock().await;
            self.ensure_connection(&mut conn_guard).await?;
            let conn = conn_guard
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("redis session backend connection unavailable"))?;
            let result: redis::RedisResult<T> = build().query_async(conn).await;
            match result {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(
                            event = SessionEvent::SessionValkeyCommandRetrySucceeded.as_str(),
                            operation,
                            attempt = attempt + 1,
                            "valkey command succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    tracing::warn!(
                        event = SessionEvent::SessionValkeyCommandRetryFailed.as_str(),
                        operation,
                        attempt = attempt + 1,
                        error = %err,
                        "valkey command attempt failed; reconnecting"
                    );
                    *conn_guard = None;
                    last_err = Some(
                        anyhow::anyhow!(err).context("redis command failed for session backend"),
                    );
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("redis command failed for unknown reason")))
    }

    async fn run_pipeline<T, F>(&self, operation: &'static str, build: F) -> Result<T>
    where
        T: FromRedisValue + Send,
        F: Fn() -> redis::Pipeline,
    {
        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..2 {
            let mut conn_guard = self.connection.lock().await;
            self.ensure_connection(&mut conn_guard).await?;
            let conn = conn_guard
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("redis session backend connection unavailable"))?;
            let result: redis::RedisResult<T> = build().query_async(conn).await;
            match result {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(
                            event = SessionEvent::SessionValkeyPipelineRetrySucceeded.as_str(),
                            operation,
                            attempt = attempt + 1,
                            "valkey pipeline succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    tracing::warn!(
                        event = SessionEvent::SessionValkeyPipelineRetryFailed.as_str(),
                        operation,
                        attempt = attempt + 1,
                        error = %err,
                        "valkey pipeline attempt failed; reconnecting"
                    );
                    *conn_guard = None;
                    last_err = Some(
                        anyhow::anyhow!(err).context("redis pipeline failed for session backend"),
                    );
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("redis pipeline failed for unknown reason")))
    }

    fn decode(session_id: &str, payload: &str) -> Result<Session> {
        serde_json::from_str(payload)
            .with_context(|| format!("corrupt session record in valkey: session_id={session_id}"))
    }
}

#[async_trait]
impl SessionStore for ValkeySessionStore {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn insert(&self, new: NewSession) -> Result<Session> {
        let session = Session::from_new(uuid::Uuid::new_v4().to_string(), new);
        let encoded =
            serde_json::to_string(&session).context("failed to encode session for redis")?;
        let key = self.record_key(&session.id);
        let index_key = self.owner_index_key(&session.owner_id);
        let ttl_secs = self.ttl_secs;

        self.run_pipeline::<(), _>("insert_session", || {
            let mut pipe = redis::pipe();
            pipe.atomic();
            pipe.cmd("HSET")
                .arg(&key)
                .arg("revision")
                .arg(session.revision)
                .arg("owner")
                .arg(&session.owner_id)
                .arg("record")
                .arg(&encoded)
                .ignore();
            pipe.cmd("SADD").arg(&index_key).arg(&session.id).ignore();
            if let Some(ttl) = ttl_secs {
                pipe.cmd("EXPIRE").arg(&key).arg(ttl).ignore();
                pipe.cmd("EXPIRE").arg(&index_key).arg(ttl).ignore();
            }
            pipe
        })
        .await?;
        tracing::debug!(
            session_id = %session.id,
            backend = "valkey",
            ttl_secs = ?ttl_secs,
            "session inserted"
        );
        Ok(session)
    }

    async fn load(&self, session_id: &str) -> Result<Option<Session>> {
        let key = self.record_key(session_id);
        let payload = self
            .run_command::<Option<String>, _>("load_session", || {
                let mut cmd = redis::cmd("HGET");
                cmd.arg(&key).arg("record");
                cmd
            })
            .await?;
        payload
            .map(|payload| Self::decode(session_id, &payload))
            .transpose()
    }

    async fn compare_and_swap(&self, expected_revision: u64, next: &Session) -> Result<CasOutcome> {
        let key = self.record_key(&next.id);
        let index_key = self.owner_index_key(&next.owner_id);
        let encoded = serde_json::to_string(next).context("failed to encode session for redis")?;
        let ttl_secs = self.ttl_secs.unwrap_or(0);
        let result = self
            .run_command::<i64, _>("compare_and_swap", || {
                let mut cmd = redis::cmd("EVAL");
                cmd.arg(COMPARE_AND_SWAP_SCRIPT)
                    .arg(2)
                    .arg(&key)
                    .arg(&index_key)
                    .arg(expected_revision)
                    .arg(next.revision)
                    .arg(&encoded)
                    .arg(ttl_secs);
                cmd
            })
            .await?;
        let outcome = match result {
            1 => CasOutcome::Swapped,
            0 => CasOutcome::Stale,
            _ => CasOutcome::Missing,
        };
        tracing::debug!(
            session_id = %next.id,
            expected_revision,
            outcome = ?outcome,
            backend = "valkey",
            "session compare-and-swap"
        );
        Ok(outcome)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        let index_key = self.owner_index_key(owner_id);
        let ids = self
            .run_command::<Vec<String>, _>("list_owner_sessions", || {
                let mut cmd = redis::cmd("SMEMBERS");
                cmd.arg(&index_key);
                cmd
            })
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| self.record_key(id)).collect();
        let payloads = self
            .run_pipeline::<Vec<Option<String>>, _>("load_owner_sessions", || {
                let mut pipe = redis::pipe();
                for key in &keys {
                    pipe.cmd("HGET").arg(key).arg("record");
                }
                pipe
            })
            .await?;

        let mut sessions = Vec::with_capacity(ids.len());
        let mut expired = Vec::new();
        for (id, payload) in ids.iter().zip(payloads) {
            match payload {
                Some(payload) => sessions.push(Self::decode(id, &payload)?),
                None => expired.push(id.clone()),
            }
        }
        if !expired.is_empty() {
            // Records expired under TTL while the index entry survived.
            self.run_command::<i64, _>("prune_owner_index", || {
                let mut cmd = redis::cmd("SREM");
                cmd.arg(&index_key);
                for id in &expired {
                    cmd.arg(id);
                }
                cmd
            })
            .await?;
        }
        Ok(sessions)
    }

    async fn delete_owned(&self, session_id: &str, owner_id: &str) -> Result<DeleteOutcome> {
        let key = self.record_key(session_id);
        let index_key = self.owner_index_key(owner_id);
        let result = self
            .run_command::<i64, _>("delete_session", || {
                let mut cmd = redis::cmd("EVAL");
                cmd.arg(DELETE_OWNED_SCRIPT)
                    .arg(2)
                    .arg(&key)
                    .arg(&index_key)
                    .arg(owner_id)
                    .arg(session_id);
                cmd
            })
            .await?;
        Ok(match result {
            1 => DeleteOutcome::Deleted,
            0 => DeleteOutcome::Forbidden,
            _ => DeleteOutcome::NotFound,
        })
    }
}

#[async_trait]
impl ProfileStore for ValkeySessionStore {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn put_resume(&self, user_id: &str, resume: StoredResume) -> Result<()> {
        let key = self.profile_resume_key(user_id);
        let payload =
            serde_json::to_string(&resume).context("failed to encode stored resume for valkey")?;
        self.run_command::<(), _>("put_profile_resume", || {
            let mut cmd = redis::cmd("SET");
            cmd.arg(&key).arg(&payload);
            cmd
        })
        .await
    }

    async fn get_resume(&self, user_id: &str) -> Result<Option<StoredResume>> {
        let key = self.profile_resume_key(user_id);
        let payload = self
            .run_command::<Option<String>, _>("get_profile_resume", || {
                let mut cmd = redis::cmd("GET");
                cmd.arg(&key);
                cmd
            })
            .await?;
        payload
            .map(|payload| {
                serde_json::from_str(&payload)
                    .with_context(|| format!("invalid stored resume payload for user {user_id}"))
            })
            .transpose()
    }
}
