pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use {
    adapters::signature::WebhookSecrets,
    axum::{
        extract::DefaultBodyLimit,
        http::StatusCode,
        routing::{get, post},
        Router,
    },
    std::{sync::Arc, time::Duration},
    tower_http::timeout::TimeoutLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub secrets: Arc<WebhookSecrets>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/webhook",
            post(adapters::webhook::stripe_webhook_handler).options(adapters::webhook::preflight),
        )
        .layer(DefaultBodyLimit::max(64 * 1024)) // Stripe events are typically <20 KB
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}
