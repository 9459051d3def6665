//! Sahayak API server binary.
//!
//! Connects to PostgreSQL, runs migrations, and serves the auth API. Refuses
//! to start without a usable JWT signing secret.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sahayak_core::auth::credentials::PgCredentialStore;
use sahayak_core::auth::jwt::JwtSecret;
use sahayak_core::auth::revocation::{PgRevocationLedger, RevocationLedger, spawn_purge_task};
use sahayak_core::auth::{AuthConfig, AuthService};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "sahayak_server", about = "Sahayak authentication API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/sahayak"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Upper bound on each credential-store / revocation-ledger call, in milliseconds.
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 5_000)]
    store_timeout_ms: u64,

    /// bcrypt work factor for new password hashes.
    #[arg(long, env = "BCRYPT_COST", default_value_t = sahayak_core::auth::password::DEFAULT_BCRYPT_COST)]
    bcrypt_cost: u32,

    /// How often expired revocation entries are purged, in seconds.
    #[arg(long, default_value_t = 3_600)]
    purge_interval_secs: u64,

    /// Include the precise token rejection reason in 401 responses.
    #[arg(long, env = "AUTH_DIAGNOSTICS", default_value_t = false)]
    auth_diagnostics: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,sahayak_api=debug,sahayak_core=debug")
                }),
        )
        .init();

    let args = Args::parse();

    // No secret, no server: tokens we could not verify must never be issued.
    let secret = match JwtSecret::from_env() {
        Ok(secret) => secret,
        Err(e) => {
            error!(error = %e, "refusing to start");
            return Err(e.into());
        }
    };

    info!(
        port = args.port,
        max_connections = args.max_connections,
        "starting sahayak_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    sahayak_core::migrate::migrate(&pool).await?;

    let ledger: Arc<dyn RevocationLedger> = Arc::new(PgRevocationLedger::new(pool.clone()));
    let auth = AuthService::new(
        &secret,
        Arc::new(PgCredentialStore::new(pool.clone())),
        ledger.clone(),
        AuthConfig {
            store_timeout: Duration::from_millis(args.store_timeout_ms),
            bcrypt_cost: args.bcrypt_cost,
            ..AuthConfig::default()
        },
    )?;

    let config = sahayak_api::config::ApiConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        expose_auth_diagnostics: args.auth_diagnostics,
    };

    let shutdown = CancellationToken::new();
    let purge_handle = spawn_purge_task(
        ledger,
        Duration::from_secs(args.purge_interval_secs.max(1)),
        shutdown.clone(),
    );

    let app = sahayak_api::router(sahayak_api::AppState {
        auth,
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
                    _ = shutdown.cancelled() => {}
                }
                shutdown.cancel();
            }
        })
        .await;

    shutdown.cancel();
    let _ = purge_handle.await;
    pool.close().await;

    serve_result?;
    Ok(())
}
