//! API Server
//!
//! Axum application builder and server startup. Requests pass through a
//! correlation-id middleware so every log line of an operation ties back
//! to one request.

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::routes;
use crate::common::Result;
use crate::logging::{generate_correlation_id, log_api_request, log_api_response};
use crate::orchestrator::PrivacyService;

/// Shared application state for all API endpoints
pub type AppState = Arc<PrivacyService>;

async fn trace_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let correlation_id = generate_correlation_id();
    let start = std::time::Instant::now();

    log_api_request(&method, &path, &correlation_id);
    let response = next.run(req).await;
    log_api_response(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_millis() as u64,
        &correlation_id,
    );

    response
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::handle_health))
        .route("/api/privacy/deposit", post(routes::handle_deposit))
        .route("/api/privacy/withdraw", post(routes::handle_withdraw))
        .route("/api/privacy/vault-deposit", post(routes::handle_vault_deposit))
        .route("/api/privacy/commission", post(routes::handle_commission))
        .route(
            "/api/privacy/milestones",
            get(routes::handle_check_milestones).post(routes::handle_milestone_proof),
        )
        .route("/api/privacy/balance", get(routes::handle_balance))
        .route("/api/privacy/vaults", get(routes::handle_vaults))
        .layer(middleware::from_fn(trace_requests))
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server
pub async fn start_server(service: AppState, port: u16) -> Result<()> {
    let app = build_router(service);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(target: "privacy::api", %addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
