use anyhow::{Context, Result};
use clap::Parser;
use contact_relay::config::{resolve_secret, RelayConfig};
use contact_relay::gateway::{build_router, GatewayState};
use contact_relay::logging::init_tracing;
use contact_relay::TurnstileVerifier;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "contact-gateway", about = "CAPTCHA verification endpoint for the contact form")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "CONTACT_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address; overrides `gateway.bind`.
    #[arg(long, env = "CONTACT_GATEWAY_BIND")]
    bind: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "info", env = "CONTACT_RELAY_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match &cli.config {
        Some(path) => RelayConfig::load(path)?,
        None => RelayConfig::default(),
    };
    let secret = resolve_secret(&config.gateway.secret_env)?;
    let verifier = TurnstileVerifier::new(config.http.build_client()?, &config.gateway.verify_url, secret);
    let app = build_router(GatewayState::new(Arc::new(verifier)));

    let bind = cli.bind.unwrap_or(config.gateway.bind);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(target: "gateway", "listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(target: "gateway", "shutting down");
        })
        .await
        .context("server failed")?;
    Ok(())
}
