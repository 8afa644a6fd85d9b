//! REST API for the Smart Sensor Flow console.
//!
//! Serves the same backend the terminal UI reads from. Runs alongside the
//! TUI (toggled from the dashboard) or as a standalone server (`sensorflow api`).

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use openapi::ApiDoc;
pub use server::{RestApiServer, RestApiStatus};
pub use state::ApiState;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/status", get(routes::health::status))
        // Plan endpoints
        .route("/api/v1/plans", get(routes::plans::list))
        .route("/api/v1/plans/:id", get(routes::plans::get_one))
        // Organization endpoints
        .route(
            "/api/v1/organizations",
            get(routes::organizations::list).post(routes::organizations::create),
        )
        .route(
            "/api/v1/organizations/:id",
            get(routes::organizations::get_one),
        )
        // Device endpoints
        .route("/api/v1/devices", get(routes::devices::list))
        .route("/api/v1/devices/:id", get(routes::devices::get_one))
        // Module endpoints
        .route(
            "/api/v1/modules",
            get(routes::modules::list).post(routes::modules::create),
        )
        .route("/api/v1/modules/:id", get(routes::modules::get_one))
        // Subscription endpoints
        .route("/api/v1/subscriptions", get(routes::subscriptions::list))
        // Directory endpoints
        .route("/api/v1/roles", get(routes::directory::roles))
        .route("/api/v1/permissions", get(routes::directory::permissions))
        .route("/api/v1/users", get(routes::directory::users))
        // Auth endpoints
        .route(
            "/api/v1/auth/password-reset",
            post(routes::auth::request_reset),
        )
        .route(
            "/api/v1/auth/password-reset/verify",
            post(routes::auth::verify_code),
        )
        .route(
            "/api/v1/auth/password-reset/complete",
            post(routes::auth::complete_reset),
        )
        .route("/api/v1/auth/sign-in", post(routes::auth::sign_in))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server and run until the process exits
pub async fn serve(state: ApiState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind REST API to {}", addr))?;
    tracing::info!("REST API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_serves_health() {
        let router = build_router(ApiState::seeded());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let router = build_router(ApiState::seeded());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/sensors")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
