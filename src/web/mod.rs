//! HTTP front end: the single page UI, its assets, the two JSON endpoints and
//! the strip download.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::constants::PUBLIC_IMAGE_PREFIX;
use crate::orchestrator::ComicOrchestrator;

mod comic;
pub(crate) mod prelude;
mod views;

use comic::{continue_comic_handler, download_comic_handler, generate_comic_handler};
use views::root_handler;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    orchestrator: Arc<ComicOrchestrator>,
}

impl AppState {
    fn new(orchestrator: ComicOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

fn create_router(state: AppState) -> Router {
    let images = ServeDir::new(state.orchestrator.store().dir());
    Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .route("/static/js/script.js", axum::routing::get(script_handler))
        .route(
            "/generate-comic",
            axum::routing::post(generate_comic_handler),
        )
        .route(
            "/continue-comic",
            axum::routing::post(continue_comic_handler),
        )
        .route(
            "/download-comic",
            axum::routing::post(download_comic_handler),
        )
        .nest_service(PUBLIC_IMAGE_PREFIX, images)
        .with_state(state)
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

async fn script_handler() -> impl IntoResponse {
    const SCRIPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/js/script.js"));
    ([(CONTENT_TYPE, "text/javascript")], SCRIPT)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Serves the comic generator until ctrl-c.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    orchestrator: ComicOrchestrator,
) -> Result<(), anyhow::Error> {
    let app = create_router(AppState::new(orchestrator));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
