//! Customer Identity Backend
//!
//! Registration, login and role management for customers, fronted by a
//! stateless bearer-token scheme.
//!
//! ## Architecture
//!
//! - Routes: HTTP handling; each handler checks the access policy first
//! - Services: registration, login, profile and promotion logic
//! - Repositories: the customer store (PostgreSQL or in-memory)
//! - Auth: token codec, credential hashing, identity middleware, policy

use anyhow::Result;
use customer_identity_backend::{
    config::{self, StorageBackend},
    db,
    repositories::{CustomerStore, InMemoryCustomerStore, PgCustomerStore},
    routes,
    state::AppState,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Customer Identity Backend"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let store = create_store(&config).await?;
    let state = AppState::new(store, config.clone());

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Build the configured customer store
async fn create_store(config: &config::AppConfig) -> Result<Arc<dyn CustomerStore>> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let pool =
                db::create_pool(&config.database.url, config.database.max_connections).await?;

            // Production runs migrations as a separate job
            if !config::AppConfig::is_production() {
                info!("Running database migrations...");
                db::run_migrations(&pool).await?;
            }

            Ok(Arc::new(PgCustomerStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory customer store; data is lost on shutdown");
            Ok(Arc::new(InMemoryCustomerStore::new()))
        }
    }
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "customer_identity_backend=info,tower_http=info".into()
        } else {
            "customer_identity_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for log aggregation
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    match &config.jwt.secret {
        Some(secret) => {
            let secret = secret.expose_secret();
            if secret.contains("development") || secret.len() < 32 {
                errors.push("JWT secret must be at least 32 characters and not contain 'development'");
            }
        }
        None => {
            warn!("No JWT secret configured; tokens will not survive a restart");
        }
    }

    if config.jwt.token_ttl_secs <= 0 {
        errors.push("JWT token TTL must be positive");
    }

    if config.storage.backend == StorageBackend::Memory {
        warn!("In-memory customer store selected for production");
    }

    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
