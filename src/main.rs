mod config;
mod db;
mod error;
mod game;
mod models;
mod routes;
mod websocket;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{routing::get, Router};
use config::Config;
use db::{PgStore, ScoreboardStore};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use websocket::MatchHub;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ScoreboardStore>,
    /// Live scoreboard subscribers, keyed by match
    pub hub: MatchHub,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catan_companion_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Catan Companion backend server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Connect to database
    let db = db::create_pool(config.database_url(), config.database.max_connections).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations completed");

    // Create application state
    let state = Arc::new(AppState {
        hub: MatchHub::new(config.realtime.channel_capacity),
        store: Arc::new(PgStore::new(db)),
        config: config.clone(),
    });

    // Spawn background task to drop update channels nobody listens to
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        hub_cleanup_task(cleanup_state).await;
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Serve the web client
    let frontend_service = ServeDir::new(&config.server.static_dir);

    // Build router
    let app = Router::new()
        // Live scoreboard endpoint
        .route("/ws/matches/{id}", get(websocket::handle_match_socket))
        // API routes
        .merge(routes::create_routes())
        .fallback_service(frontend_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Live scoreboards: ws://{}/ws/matches/{{id}}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Web client: http://{}/ (from {})", addr, config.server.static_dir);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Background task that periodically removes realtime channels without subscribers
async fn hub_cleanup_task(state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.realtime.cleanup_interval_secs.max(1));
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        let removed = state.hub.prune_idle();
        if removed > 0 {
            tracing::debug!(
                "Removed {} idle match channels ({} still open)",
                removed,
                state.hub.channel_count()
            );
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, finishing open requests");
}
