//! HTTP surface: the generate pipeline, public read endpoints and the admin export.

use std::net::SocketAddr;
use std::num::NonZeroU16;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::artifact::ArtifactStore;
use crate::config::AppConfig;
use crate::constants::{GENERATED_MOUNT, MAX_BODY_BYTES, PLAYERS_MOUNT};
use crate::error::RosterError;
use crate::gemini::GeminiClient;
use crate::notifier::Notifier;
use crate::tasks::BackgroundTasks;

mod admin;
mod extractors;
mod generate;
mod prelude;
mod public;

use admin::emails_handler;
use generate::generate_handler;
use public::{gallery_handler, health_handler, stats_handler};

/// Outbound calls give up after this long.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(180);

/// Everything a request handler needs, cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    config: Arc<AppConfig>,
    db: DatabaseConnection,
    gemini: GeminiClient,
    notifier: Notifier,
    artifacts: ArtifactStore,
    tasks: BackgroundTasks,
}

impl AppState {
    /// Wires the components up from the config.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self, RosterError> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;
        let artifacts = ArtifactStore::new(
            config.generated_dir.clone(),
            config.public_base_url.clone(),
        );
        Ok(Self {
            gemini: GeminiClient::new(http.clone(), config.gemini.clone()),
            notifier: Notifier::new(http, config.email.clone()),
            artifacts,
            tasks: BackgroundTasks::new(),
            config: Arc::new(config),
            db,
        })
    }

    /// Pending email and consent work.
    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }
}

fn create_router(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_handler))
        .route("/health", get(health_handler))
        .route("/emails", get(emails_handler))
        .route("/stats", get(stats_handler))
        .route("/gallery", get(gallery_handler))
        .nest_service(GENERATED_MOUNT, ServeDir::new(&config.generated_dir))
        .nest_service(PLAYERS_MOUNT, ServeDir::new(&config.players_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Serves the app until Ctrl-C, then waits for background work to finish.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    state: AppState,
) -> Result<(), anyhow::Error> {
    state.artifacts.ensure_dir().await?;
    let tasks = state.tasks.clone();
    let app = create_router(&state.config).with_state(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!("Server error: {}", err);
    }

    info!("Waiting for background tasks");
    tasks.drain().await;
    Ok(())
}
