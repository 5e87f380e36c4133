//! Config namespace: YAML runtime settings and the resolved service config.

mod interview;
mod settings;

pub use interview::{
    AuthConfig, DEV_SECRET_KEY, InterviewConfig, InterviewPolicy, LlmConfig, MISTRAL_DEFAULT_URL,
    OLLAMA_DEFAULT_URL, ServerConfig, SessionBackendKind,
};
pub use settings::{
    AuthSettings, InterviewSettings, LlmSettings, RuntimeSettings, ServerSettings,
    SessionSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
