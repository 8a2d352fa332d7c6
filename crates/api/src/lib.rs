//! HTTP API server with observability for the storefront.
//!
//! Every route reads its JSON contract, resolves the caller from the bearer
//! token and hands a request to the application mediator. Logging goes
//! through `tracing` and request metrics are exported for Prometheus.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use application::services::{
    HmacPasswordHasher, IdentityError, JwtTokenService, MockPaymentGateway, SystemClock,
    derive_key,
};
use application::{AppContext, Mediator};
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::DocumentStore;
use shared_kernel::Money;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub mediator: Mediator,
}

impl AppState {
    pub fn new(mediator: Mediator) -> Arc<Self> {
        Arc::new(Self { mediator })
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .merge(routes::identity::router())
        .merge(routes::catalog::router())
        .merge(routes::shipping::router())
        .merge(routes::promotions::router())
        .merge(routes::orders::router());

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers([CONTENT_TYPE, AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
}

const PASSWORD_PEPPER_PURPOSE: &str = "password-pepper";
const TOKEN_SIGNING_PURPOSE: &str = "token-signing";

/// Builds the services handed to every request from configuration.
///
/// The password pepper and the token signing key are derived separately
/// from the configured secret.
pub fn create_context(
    config: &Config,
    store: Arc<dyn DocumentStore>,
) -> Result<AppContext, IdentityError> {
    let secret = config.jwt_secret.as_bytes();
    let pepper = derive_key(secret, PASSWORD_PEPPER_PURPOSE)?;
    let signing_key = derive_key(secret, TOKEN_SIGNING_PURPOSE)?;

    let hasher = HmacPasswordHasher::new(&pepper, config.password_iterations)?;
    let tokens = JwtTokenService::new(
        &signing_key,
        config.jwt_issuer.clone(),
        chrono::Duration::minutes(config.token_ttl_minutes),
    );
    let gateway = MockPaymentGateway::new(Money::from_cents(config.payment_approval_limit_cents));

    Ok(AppContext::new(
        store,
        Arc::new(gateway),
        Arc::new(hasher),
        Arc::new(tokens),
        Arc::new(SystemClock),
    ))
}
