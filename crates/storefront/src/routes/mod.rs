//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Health check
//!
//! # Products
//! GET    /api/products              - Product listing (search, price, genre, size filters)
//! GET    /api/products/{id}         - Product detail
//! GET    /api/sizes                 - Size chart (client form)
//!
//! # Cart (session)
//! GET    /api/cart                  - Show cart
//! DELETE /api/cart                  - Empty cart
//! POST   /api/cart/items            - Add item
//! PATCH  /api/cart/items            - Set quantity (0 removes)
//! DELETE /api/cart/items            - Remove item
//!
//! # Favorites (session)
//! GET    /api/favorites             - List favorites
//! POST   /api/favorites             - Save favorite
//! POST   /api/favorites/toggle      - Toggle favorite
//! DELETE /api/favorites/{product_id} - Remove favorite
//! ```

pub mod cart;
pub mod favorites;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route(
            "/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index).post(favorites::add))
        .route("/toggle", post(favorites::toggle))
        .route("/{product_id}", delete(favorites::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/products", product_routes())
        .route("/api/sizes", get(products::sizes))
        .nest("/api/cart", cart_routes())
        .nest("/api/favorites", favorite_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
