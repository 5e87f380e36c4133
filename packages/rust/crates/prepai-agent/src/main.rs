//! prepai-agent CLI: run the interview gateway or mint bearer tokens.
//!
//! Settings: `packages/conf/settings.yaml`, overridden by `<config home>/prepai/settings.yaml`
//! (`--conf <dir>` replaces the config home), then by `PREPAI_*` environment variables.
//!
//! Logging: set `RUST_LOG=prepai_agent=debug` (or `info`, `warn`) to see agent logs on stderr.

mod cli;
mod service_builder;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use prepai_agent::{
    HmacIdentityProvider, IdentityProvider, InterviewConfig, load_runtime_settings, run_http,
    set_config_home_override,
};

use crate::cli::{Cli, Command};
use crate::service_builder::{build_gateway_state, build_identity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "prepai_agent=debug"
        } else {
            "prepai_agent=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let runtime_settings = load_runtime_settings();
    let mut config = InterviewConfig::from_settings(&runtime_settings);

    match cli.command {
        Command::Serve {
            bind,
            request_timeout,
            max_concurrent,
        } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(secs) = request_timeout.filter(|v| *v > 0) {
                config.server.request_timeout_secs = secs;
            }
            if let Some(max) = max_concurrent {
                config.server.max_concurrent_requests = (max > 0).then_some(max);
            }
            let state = build_gateway_state(&config)?;
            let bind_addr = config.server.bind.clone();
            run_http(state, &bind_addr).await
        }
        Command::IssueToken { user, ttl_secs } => {
            let identity = match ttl_secs.filter(|v| *v > 0) {
                Some(ttl) => HmacIdentityProvider::new(&config.auth.secret_key, ttl)?,
                None => build_identity(&config)?,
            };
            let token = identity.issue(&user)?;
            println!("{token}");
            Ok(())
        }
    }
}
