use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "prepai-agent")]
#[command(about = "PrepAI interview backend: HTTP/WebSocket gateway and token tooling.")]
pub(crate) struct Cli {
    /// Override config directory (reads `<conf>/prepai/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Debug-level logs (ignored when RUST_LOG is set).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the HTTP gateway (routes under /api). Default bind from settings: 0.0.0.0:5000
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// Timeout in seconds for LLM-bound requests (overrides server.request_timeout_secs)
        #[arg(long)]
        request_timeout: Option<u64>,

        /// Max concurrent LLM-bound requests (overrides server.max_concurrent_requests)
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
    /// Mint a bearer token for a user id with the configured secret.
    IssueToken {
        /// User id placed in the token subject
        #[arg(long)]
        user: String,

        /// Token lifetime in seconds (overrides auth.token_ttl_secs)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}
