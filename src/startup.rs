use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index, metrics},
    auth::{authenticate, logout, send_magic_link},
    orgs::{create_organization, enable_jit, exchange, organization_index, switch_orgs},
};
use crate::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use crate::services::stytch::StytchClient;

pub fn build_router(stytch: Arc<StytchClient>) -> Router {
    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/send_magic_link", post(send_magic_link))
        .route("/authenticate", get(authenticate))
        .route("/logout", get(logout))
        .route("/create_organization", post(create_organization))
        .route("/exchange/:organization_id", get(exchange))
        .route("/switch_orgs", get(switch_orgs))
        .route("/orgs/:organization_slug", get(organization_index))
        .route("/enable_jit", get(enable_jit))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(stytch)
}
