//! crowdmerge server binary
//!
//! Runs the webhook endpoint and the reconciliation sweep as concurrent
//! tasks against the same registration store.

use anyhow::Context;
use clap::Parser;
use crowdmerge::platform::{GitHubFactory, PlatformFactory};
use crowdmerge::registry::{FileRegistry, RegistrationStore};
use crowdmerge::sweep;
use crowdmerge::webhook::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "crowdmerge", about = "Trust-weighted automatic merging of pull requests")]
struct Args {
    /// Port for the webhook server
    #[arg(long, env = "PORT", default_value_t = 5001)]
    port: u16,

    /// Minutes between reconciliation sweeps
    #[arg(long, env = "SWEEP_INTERVAL_MINUTES", default_value_t = 51)]
    sweep_interval_minutes: u64,

    /// Path to the repository registration file
    #[arg(long, env = "REGISTRY_PATH", default_value = "registrations.toml")]
    registry: PathBuf,

    /// Dashboard base URL used in statuses and comments
    #[arg(long, env = "BASE_URL", default_value = "https://crowdmerge.example.org")]
    base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let registry: Arc<dyn RegistrationStore> = Arc::new(
        FileRegistry::load(&args.registry)
            .with_context(|| format!("loading registry from {}", args.registry.display()))?,
    );
    let factory: Arc<dyn PlatformFactory> = Arc::new(GitHubFactory);

    let state = AppState {
        registry: Arc::clone(&registry),
        factory: Arc::clone(&factory),
        base_url: args.base_url.clone(),
    };

    tokio::spawn(sweep::run(
        registry,
        factory,
        args.base_url,
        Duration::from_secs(args.sweep_interval_minutes * 60),
    ));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));
    info!(%addr, "starting webhook server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, webhook::router(state))
        .await
        .context("webhook server failed")?;

    Ok(())
}
