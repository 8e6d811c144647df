//! jobgate entry point.
//!
//! Serves the job board front end behind the route gate and exposes the
//! session API (login, logout, account, permissions, menu).

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobgate::config::GateConfig;
use jobgate::error::Result;
use jobgate::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // RUST_LOG controls verbosity, e.g. RUST_LOG=jobgate=debug
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jobgate starting...");

    let config = GateConfig::from_env()?;
    tracing::info!(
        backend = %config.backend_url,
        admin_roles = ?config.roles.admin_roles,
        super_admin = %config.roles.super_admin,
        static_dir = %config.static_dir,
        "Configuration loaded"
    );

    let port = config.web_port;
    let state = AppState::new(config)?;
    let router = web::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(port = port, "Web server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
