//! `sealed-chat`: chat back-end binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables, decoding the
//!    process encryption key.
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP export).
//! 3. Build the envelope cipher from the process key.
//! 4. Wire the credential store and message pipeline.
//! 5. Build the Axum router and serve until ctrl-c.

mod config;
mod credentials;
mod crypto;
mod error;
mod llm;
mod messages;
mod server;
mod store;
mod telemetry;

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use config::Config;
use crypto::EnvelopeCipher;
use llm::CompletionRegistry;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let (cfg, key) = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otlp_endpoint(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.listen_port,
        "sealed-chat starting"
    );

    // -----------------------------------------------------------------------
    // 3. Cipher
    // -----------------------------------------------------------------------
    let cipher = EnvelopeCipher::new(key)?;
    info!("encryption key loaded");

    // -----------------------------------------------------------------------
    // 4. Services
    // -----------------------------------------------------------------------
    let state = AppState::in_memory(
        cipher,
        CompletionRegistry::offline(),
        cfg.user_header_name.clone(),
    );

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(state, Duration::from_secs(cfg.request_timeout_secs));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    telemetry::shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
