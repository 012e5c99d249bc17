//! Minimoda Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use state::AppState;

/// Build the storefront router with sessions, request IDs and CORS.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let cors = cors_layer(state.config().allowed_origin.as_deref());

    let router = routes::routes().layer(session_layer);
    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .with_state(state)
}

/// CORS for the configured browser origin, with credentials so the session
/// cookie is sent.
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    let Ok(origin) = HeaderValue::from_str(origin) else {
        tracing::warn!(origin, "Ignoring invalid STOREFRONT_ALLOWED_ORIGIN");
        return None;
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}
