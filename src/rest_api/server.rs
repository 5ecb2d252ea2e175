//! Axum HTTP server for the launcher control plane

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;
use crate::LauncherState;

use super::handlers;

/// Build the full routing table.
///
/// The health probes are mounted outside the trace layer so that the
/// scheduler's liveness/readiness polling does not flood the access log.
/// The panic-catching layer wraps everything.
pub fn build_router(state: Arc<LauncherState>) -> Router {
    let api = Router::new()
        .route("/status", get(handlers::status))
        .route(
            "/validator",
            get(handlers::get_validators)
                .post(handlers::create_validator)
                .put(handlers::update_validator)
                .delete(handlers::delete_validator),
        )
        .route("/start", post(handlers::start_validator))
        .route("/", get(handlers::root_redirect))
        .route("/swagger", get(handlers::swagger_redirect))
        .layer(TraceLayer::new_for_http());

    Router::new()
        .route("/healthz", get(handlers::liveness))
        .route("/readyz", get(handlers::readiness))
        .merge(api)
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn run_server(state: Arc<LauncherState>, address: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let listen_addr = format!("{address}:{port}");
    info!("HTTP server starting on {}", listen_addr);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
