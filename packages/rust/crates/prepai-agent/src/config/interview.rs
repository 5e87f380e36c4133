//! Resolved service configuration: settings file values, then env overrides, then defaults.

use super::settings::RuntimeSettings;

/// Mistral's OpenAI-compatible chat endpoint.
pub const MISTRAL_DEFAULT_URL: &str = "https://api.mistral.ai/v1/chat/completions";
/// Ollama's OpenAI-compatible chat endpoint.
pub const OLLAMA_DEFAULT_URL: &str = "http://127.0.0.1:11434/v1/chat/completions";
/// Development-only signing secret; override with `PREPAI_SECRET_KEY` in any real deployment.
pub const DEV_SECRET_KEY: &str = "prepai_local_dev_key_2026";

const DEFAULT_MODEL: &str = "llama3:8b";
const DEFAULT_SESSION_KEY_PREFIX: &str = "prepai:session";

/// Session store backend choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackendKind {
    Memory,
    Valkey {
        url: String,
        key_prefix: String,
        ttl_secs: Option<u64>,
    },
}

impl SessionBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Valkey { .. } => "valkey",
        }
    }
}

/// Chat-completions backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub inference_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

/// Orchestrator policy knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewPolicy {
    /// Budget used when a create request omits `question_budget`.
    pub default_question_budget: u32,
    /// Largest budget a client may request.
    pub max_question_budget: u32,
    /// Calls per generation/evaluation before the fallback value is used (1 = no retry).
    pub generation_attempts: u32,
    /// Resume text stored on the session is cut to this many characters.
    pub resume_context_chars: usize,
}

impl Default for InterviewPolicy {
    fn default() -> Self {
        Self {
            default_question_budget: 5,
            max_question_budget: 10,
            generation_attempts: 2,
            resume_context_chars: 2500,
        }
    }
}

/// Bearer token issuance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub token_ttl_secs: u64,
}

/// HTTP gateway limits.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub request_timeout_secs: u64,
    /// When Some, limits concurrent LLM-bound requests.
    pub max_concurrent_requests: Option<usize>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct InterviewConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub policy: InterviewPolicy,
    pub session_backend: SessionBackendKind,
    pub auth: AuthConfig,
}

impl InterviewConfig {
    /// Resolve from merged settings and the process environment.
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        Self::from_settings_with_env(settings, |key| std::env::var(key).ok())
    }

    #[doc(hidden)]
    pub fn from_settings_with_env<F>(settings: &RuntimeSettings, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let defaults = InterviewPolicy::default();
        let interview = &settings.interview;
        let max_question_budget = interview
            .max_question_budget
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_question_budget);
        let policy = InterviewPolicy {
            default_question_budget: interview
                .default_question_budget
                .filter(|v| *v > 0)
                .unwrap_or(defaults.default_question_budget)
                .min(max_question_budget),
            max_question_budget,
            generation_attempts: interview
                .generation_attempts
                .filter(|v| *v > 0)
                .unwrap_or(defaults.generation_attempts),
            resume_context_chars: interview
                .resume_context_chars
                .filter(|v| *v > 0)
                .unwrap_or(defaults.resume_context_chars),
        };

        let llm = LlmConfig {
            inference_url: env_value("PREPAI_LLM_URL")
                .or_else(|| non_empty(&settings.llm.inference_url))
                .unwrap_or_else(|| OLLAMA_DEFAULT_URL.to_string()),
            model: env_value("PREPAI_MODEL")
                .or_else(|| non_empty(&settings.llm.model))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: env_value("PREPAI_API_KEY")
                .or_else(|| non_empty(&settings.llm.api_key))
                .or_else(|| env_value("MISTRAL_API_KEY"))
                .or_else(|| env_value("OPENAI_API_KEY")),
            temperature: settings
                .llm
                .temperature
                .filter(|t| t.is_finite() && (0.0..=2.0).contains(t))
                .unwrap_or(0.7),
            request_timeout_secs: settings
                .llm
                .request_timeout_secs
                .filter(|v| *v > 0)
                .unwrap_or(60),
        };

        let backend_name = non_empty(&settings.session.backend)
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase();
        let valkey_url =
            env_value("VALKEY_URL").or_else(|| non_empty(&settings.session.valkey_url));
        let session_backend = match (backend_name.as_str(), valkey_url) {
            ("valkey" | "redis", Some(url)) => SessionBackendKind::Valkey {
                url,
                key_prefix: env_value("PREPAI_SESSION_PREFIX")
                    .or_else(|| non_empty(&settings.session.key_prefix))
                    .unwrap_or_else(|| DEFAULT_SESSION_KEY_PREFIX.to_string()),
                ttl_secs: settings.session.ttl_secs.filter(|v| *v > 0),
            },
            ("valkey" | "redis", None) => {
                tracing::warn!(
                    backend = %backend_name,
                    "valkey session backend requested without url; using memory backend"
                );
                SessionBackendKind::Memory
            }
            ("memory", _) => SessionBackendKind::Memory,
            (other, _) => {
                tracing::warn!(
                    backend = %other,
                    "unknown session backend; using memory backend"
                );
                SessionBackendKind::Memory
            }
        };

        let auth = AuthConfig {
            secret_key: env_value("PREPAI_SECRET_KEY")
                .or_else(|| env_value("SECRET_KEY"))
                .or_else(|| non_empty(&settings.auth.secret_key))
                .unwrap_or_else(|| DEV_SECRET_KEY.to_string()),
            token_ttl_secs: settings
                .auth
                .token_ttl_secs
                .filter(|v| *v > 0)
                .unwrap_or(24 * 60 * 60),
        };

        let server = ServerConfig {
            bind: non_empty(&settings.server.bind).unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            request_timeout_secs: settings
                .server
                .request_timeout_secs
                .filter(|v| *v > 0)
                .unwrap_or(120),
            max_concurrent_requests: settings.server.max_concurrent_requests.filter(|v| *v > 0),
            max_upload_bytes: settings
                .server
                .max_upload_bytes
                .filter(|v| *v > 0)
                .unwrap_or(10 * 1024 * 1024),
        };

        Self {
            server,
            llm,
            policy,
            session_backend,
            auth,
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.auth.secret_key == DEV_SECRET_KEY
    }
}
