//! Biblion Server - library circulation and inventory engine

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biblion_server::{
    api,
    config::AppConfig,
    models::user::{CreateUser, Role},
    repository::Repository,
    services::{sweeper::OverdueSweeper, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("biblion_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Biblion Server v{}", env!("CARGO_PKG_VERSION"));

    // Create stores and services
    let repository = Repository::new();
    let services = Services::new(
        repository.clone(),
        config.auth.clone(),
        config.circulation.clone(),
    );

    // Seed the administrator account
    let admin = repository.users.insert(CreateUser {
        name: config.auth.admin_name.clone(),
        card_number: config.auth.admin_card.clone(),
        role: Some(Role::Admin),
    })?;
    tracing::info!(admin_id = %admin.id, "seeded administrator account");

    // Recovery pass: the ledger, not the stored counters, is authoritative
    services.circulation.reconcile_inventory();

    // Spawn the overdue sweeper
    let sweeper = OverdueSweeper::new(
        repository.ledger.clone(),
        Duration::from_secs(config.circulation.sweep_interval_secs),
    );
    tokio::spawn(sweeper.run());
    tracing::info!(
        interval_secs = config.circulation.sweep_interval_secs,
        "overdue sweeper started"
    );

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create application state and router
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::create_router(state);

    // Start server
    let addr = SocketAddr::new(server_host.parse().expect("Invalid host address"), server_port);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
