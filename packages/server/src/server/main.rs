// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use expo::ExpoClient;
use recipes_core::domains::auth::JwtService;
use recipes_core::kernel::{
    run_notification_worker, ChangeHub, ExpoNotificationSink, NotificationQueue,
    PostgresAccountStore, PostgresAdminDirectory, PostgresRecipeStore, ServerDeps,
};
use recipes_core::server::{build_app, AppState};
use recipes_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recipes_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Recipe Finder API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        admins = config.admin_emails.len(),
        push_enabled = config.expo_access_token.is_some(),
        "Configuration loaded"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Notifications are delivered by a background worker after commit
    let (notifications, notification_rx) = NotificationQueue::new();
    let sink = ExpoNotificationSink::new(
        ExpoClient::new(config.expo_access_token.clone()),
        pool.clone(),
        config.admin_emails.clone(),
    );
    tokio::spawn(run_notification_worker(notification_rx, Arc::new(sink)));

    let deps = ServerDeps::new(
        Arc::new(PostgresRecipeStore::new(pool.clone())),
        Arc::new(PostgresAccountStore::new(pool.clone())),
        Arc::new(PostgresAdminDirectory::new(
            pool.clone(),
            config.admin_emails.clone(),
        )),
        notifications,
        ChangeHub::new(),
    );

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let state = AppState::new(deps, jwt_service, Some(pool));

    // Build application
    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
