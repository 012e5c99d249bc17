//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Health check
//!
//! # Auth (token from the redirect login, kept in the session)
//! POST   /auth/token                   - Store token and user
//! GET    /auth/token                   - Session status
//! DELETE /auth/token                   - Logout
//! GET    /auth/me                      - Stored user profile
//!
//! # Products (admin token required)
//! GET    /api/products                 - Listing, all statuses unless filtered
//! POST   /api/products                 - Create (JSON or multipart)
//! GET    /api/products/{id}            - Detail
//! PUT    /api/products/{id}            - Update (JSON or multipart)
//! DELETE /api/products/{id}            - Soft delete (optimistic)
//! POST   /api/products/{id}/restore    - Restore (optimistic)
//! GET    /api/products/view            - Current list view
//! POST   /api/products/view/refresh    - Refetch list view
//!
//! # Uploads (admin token required)
//! POST   /api/uploads                  - Upload an image
//! POST   /api/uploads/signature        - Signed direct-upload parameters
//! ```

pub mod auth;
pub mod products;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::media::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Room for the multipart envelope and text fields around a full-size image.
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 2 * 1024 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/view", get(products::view))
        .route("/view/refresh", post(products::refresh))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/restore", post(products::restore))
}

/// Create the upload routes router.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(uploads::upload))
        .route("/signature", post(uploads::signature))
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .nest("/api/products", product_routes())
        .nest("/api/uploads", upload_routes())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
