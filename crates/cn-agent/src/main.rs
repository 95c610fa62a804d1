//! Clio NLP agent — REST server for natural-language queries against the
//! Clio API and the local CLI services.
//!
//! Usage: `cn-agent [config.toml]`. The Clio token comes from
//! `CLIO_ACCESS_TOKEN`.

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use cn_agent::config::{AgentConfig, access_token_from_env};
use cn_agent::routes::build_router;
use cn_agent::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cn-agent starting");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(path = %path, "loading config");
            AgentConfig::from_file(&path)?
        }
        None => {
            tracing::warn!("no config file given, using defaults");
            AgentConfig::default()
        }
    }
    .with_env_overrides()?;

    let state = AppState::from_config(&config, access_token_from_env())?;
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
