//! REST API module
//!
//! Organized into domain-specific submodules for maintainability.

mod admin;
mod error;
mod types;
mod vault;

use crate::api::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

// Re-export router functions for external use
pub use admin::admin_routes;
pub use vault::vault_routes;

/// Build the application router with all middleware applied
pub fn router(state: AppState) -> Router {
    // Allowed origins come from CORS_ORIGINS (comma-separated)
    let cors_origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    tracing::debug!("CORS allowed origins: {:?}", cors_origins);

    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        // Expose X-Request-Id header to clients
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")]);

    // Request ID header name
    let x_request_id = header::HeaderName::from_static("x-request-id");

    // Tracing layer with request ID included in spans
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(true).level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .merge(vault_routes())
        .merge(admin_routes())
        .layer(cors)
        // Request ID: Generate UUID, set on request, propagate to response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(trace_layer)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown: wait for SIGTERM or SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
