use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use prepai_agent::{
    DocumentResumeExtractor, GatewayState, HmacIdentityProvider, InterviewConfig,
    InterviewOrchestrator, LlmClient, LlmInterviewer, MemoryProfileStore, MemorySessionStore,
    ProfileStore, SessionBackendKind, SessionStore, ValkeySessionStore,
};

pub(crate) fn build_identity(config: &InterviewConfig) -> Result<HmacIdentityProvider> {
    if config.uses_dev_secret() {
        tracing::warn!(
            "auth secret not configured; using the development key (set PREPAI_SECRET_KEY)"
        );
    }
    HmacIdentityProvider::new(&config.auth.secret_key, config.auth.token_ttl_secs)
}

/// Session and profile stores share one backend; Valkey shares one client.
fn build_stores(
    config: &InterviewConfig,
) -> Result<(Arc<dyn SessionStore>, Arc<dyn ProfileStore>)> {
    Ok(match &config.session_backend {
        SessionBackendKind::Memory => (
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryProfileStore::new()),
        ),
        SessionBackendKind::Valkey {
            url,
            key_prefix,
            ttl_secs,
        } => {
            let store = Arc::new(
                ValkeySessionStore::new(url.clone(), Some(key_prefix.clone()), *ttl_secs)
                    .context("failed to initialize valkey session store")?,
            );
            (store.clone(), store)
        }
    })
}

pub(crate) fn build_gateway_state(config: &InterviewConfig) -> Result<GatewayState> {
    let (store, profiles) = build_stores(config)?;
    tracing::info!(
        backend = config.session_backend.as_str(),
        "session store configured"
    );
    let llm = LlmClient::new(
        config.llm.inference_url.clone(),
        config.llm.model.clone(),
        config.llm.api_key.clone(),
        config.llm.temperature,
        Duration::from_secs(config.llm.request_timeout_secs),
    )?;
    tracing::info!(
        inference_url = %config.llm.inference_url,
        model = %config.llm.model,
        api_key_set = config.llm.api_key.is_some(),
        "llm interviewer configured"
    );
    let interviewer = Arc::new(LlmInterviewer::new(llm));
    let orchestrator = Arc::new(InterviewOrchestrator::new(
        store,
        interviewer.clone(),
        interviewer.clone(),
        config.policy.clone(),
    ));
    let identity = Arc::new(build_identity(config)?);
    Ok(GatewayState::new(
        orchestrator,
        identity,
        Arc::new(DocumentResumeExtractor),
        interviewer,
        profiles,
        &config.server,
    ))
}
