//! YAML runtime settings: shipped defaults in `<PRJ_ROOT>/packages/conf/settings.yaml`,
//! per-user overrides in `<PRJ_CONFIG_HOME>/prepai/settings.yaml`. A key set in the
//! user layer wins; unreadable or invalid layers are skipped with a warning.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

const SYSTEM_LAYER: &str = "packages/conf/settings.yaml";
const USER_LAYER: &str = "prepai/settings.yaml";
const FALLBACK_CONFIG_HOME: &str = ".config";

/// Set once by `--conf`; takes precedence over `PRJ_CONFIG_HOME`.
static CONF_DIR: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub interview: InterviewSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSettings {
    pub bind: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_concurrent_requests: Option<usize>,
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmSettings {
    pub inference_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewSettings {
    pub default_question_budget: Option<u32>,
    pub max_question_budget: Option<u32>,
    pub generation_attempts: Option<u32>,
    pub resume_context_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSettings {
    /// `memory` or `valkey`.
    pub backend: Option<String>,
    pub valkey_url: Option<String>,
    pub key_prefix: Option<String>,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    pub secret_key: Option<String>,
    pub token_ttl_secs: Option<u64>,
}

impl RuntimeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            server: self.server.merge(overlay.server),
            llm: self.llm.merge(overlay.llm),
            interview: self.interview.merge(overlay.interview),
            session: self.session.merge(overlay.session),
            auth: self.auth.merge(overlay.auth),
        }
    }
}

impl ServerSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            bind: overlay.bind.or(self.bind),
            request_timeout_secs: overlay.request_timeout_secs.or(self.request_timeout_secs),
            max_concurrent_requests: overlay
                .max_concurrent_requests
                .or(self.max_concurrent_requests),
            max_upload_bytes: overlay.max_upload_bytes.or(self.max_upload_bytes),
        }
    }
}

impl LlmSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            inference_url: overlay.inference_url.or(self.inference_url),
            model: overlay.model.or(self.model),
            api_key: overlay.api_key.or(self.api_key),
            temperature: overlay.temperature.or(self.temperature),
            request_timeout_secs: overlay.request_timeout_secs.or(self.request_timeout_secs),
        }
    }
}

impl InterviewSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            default_question_budget: overlay
                .default_question_budget
                .or(self.default_question_budget),
            max_question_budget: overlay.max_question_budget.or(self.max_question_budget),
            generation_attempts: overlay.generation_attempts.or(self.generation_attempts),
            resume_context_chars: overlay.resume_context_chars.or(self.resume_context_chars),
        }
    }
}

impl SessionSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            backend: overlay.backend.or(self.backend),
            valkey_url: overlay.valkey_url.or(self.valkey_url),
            key_prefix: overlay.key_prefix.or(self.key_prefix),
            ttl_secs: overlay.ttl_secs.or(self.ttl_secs),
        }
    }
}

impl AuthSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            secret_key: overlay.secret_key.or(self.secret_key),
            token_ttl_secs: overlay.token_ttl_secs.or(self.token_ttl_secs),
        }
    }
}

/// Settings from both layers, user over system.
pub fn load_runtime_settings() -> RuntimeSettings {
    let (system, user) = runtime_settings_paths();
    load_runtime_settings_from_paths(&system, &user)
}

#[doc(hidden)]
pub fn runtime_settings_paths() -> (PathBuf, PathBuf) {
    let root = env_path("PRJ_ROOT")
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let conf_dir = CONF_DIR
        .get()
        .cloned()
        .or_else(|| env_path("PRJ_CONFIG_HOME"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_CONFIG_HOME));
    let conf_dir = if conf_dir.is_absolute() {
        conf_dir
    } else {
        root.join(conf_dir)
    };
    (root.join(SYSTEM_LAYER), conf_dir.join(USER_LAYER))
}

#[doc(hidden)]
pub fn load_runtime_settings_from_paths(system: &Path, user: &Path) -> RuntimeSettings {
    [system, user]
        .into_iter()
        .filter_map(|path| match read_layer(path) {
            Ok(layer) => layer,
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %format!("{error:#}"),
                    "settings layer skipped"
                );
                None
            }
        })
        .fold(RuntimeSettings::default(), RuntimeSettings::merge)
}

/// `Ok(None)` when the file does not exist.
fn read_layer(path: &Path) -> Result<Option<RuntimeSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let layer = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(layer))
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Point the user layer at `dir` (CLI `--conf`). Relative paths resolve against `PRJ_ROOT`.
pub fn set_config_home_override(dir: impl Into<PathBuf>) {
    let dir = dir.into();
    if dir.as_os_str().is_empty() {
        return;
    }
    if let Err(rejected) = CONF_DIR.set(dir) {
        tracing::warn!(
            ignored = %rejected.display(),
            "config directory already chosen; keeping the first one"
        );
    }
}
