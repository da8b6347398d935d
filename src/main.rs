//! authgate - Token Authentication Service
//! Mission: Issue signed tokens on login and guard protected routes by role

use anyhow::{Context, Result};
use authgate::{
    auth::{
        user_store::seed_demo_credentials, AccessGuard, AuthState, Authenticator, BcryptVerifier,
        SqliteCredentialStore, TokenCodec,
    },
    build_router,
    config::Args,
};
use bcrypt::DEFAULT_COST;
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let args = Args::parse();

    info!("🚀 authgate starting");

    // Without a trustworthy key nothing issued or verified would mean anything
    let jwt_config = args
        .jwt_config()
        .context("Invalid signing configuration")?;
    let roles = args
        .recognized_roles()
        .context("Invalid role configuration")?;

    let codec = Arc::new(TokenCodec::new(&jwt_config).context("Failed to build token codec")?);
    info!(
        algorithm = ?codec.algorithm(),
        ttl_secs = codec.default_ttl().as_secs(),
        "🔐 Token codec initialized"
    );

    let store = SqliteCredentialStore::new(&args.auth_db_path)?;
    if args.seed_demo_users {
        seed_demo_credentials(&store, DEFAULT_COST)?;
    }
    info!("🔐 Credential store at: {}", args.auth_db_path);

    let authenticator = Arc::new(Authenticator::new(
        Arc::new(store),
        Arc::new(BcryptVerifier),
        codec.clone(),
    ));
    let guard = Arc::new(AccessGuard::new(codec, roles.clone()));
    info!(
        "🛡️  Recognized roles: {}",
        roles
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let app = build_router(AuthState::new(authenticator, guard));

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("🎯 API server listening on {}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents); a missing file is fine
    let _ = dotenv();
}
