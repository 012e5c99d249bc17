//! Cart route handlers.
//!
//! The cart lives in the session. Every mutation re-fetches the product so
//! stock and price checks run against the catalog, then writes the cart
//! back to the session.

use axum::{Json, extract::State};
use minimoda_core::{Cart, CartItem, Price, ProductId, Size};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::models::{self, session_keys};
use crate::state::AppState;

/// Cart as returned to the shopper.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub subtotal: Price,
}

/// Cart line with its computed total.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    #[serde(flatten)]
    pub item: CartItem,
    pub line_total: Price,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            item_count: cart.total_quantity(),
            subtotal: cart.subtotal(),
            items: cart
                .items
                .into_iter()
                .map(|item| CartItemView {
                    line_total: item.line_total(),
                    item,
                })
                .collect(),
        }
    }
}

/// Add or update a cart line.
#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    pub product_id: String,
    pub size: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Remove a cart line.
#[derive(Debug, Deserialize)]
pub struct RemoveLineRequest {
    pub product_id: String,
    pub size: String,
}

const fn default_quantity() -> u32 {
    1
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(models::load(session, session_keys::CART).await?)
}

async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    Ok(models::store(session, session_keys::CART, cart).await?)
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    Ok(Json(load_cart(&session).await?.into()))
}

/// Add an item to the cart.
///
/// Deleted products are refused with 400 like any other unavailable item.
/// Adding a line already in the cart merges the quantities, clamped to the
/// stock on hand.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<CartLineRequest>,
) -> Result<Json<CartView>> {
    let size = Size::parse(&request.size)?;
    let product = state
        .catalog()
        .lookup_product(&ProductId::new(request.product_id))
        .await?;

    let mut cart = load_cart(&session).await?;
    cart.add(&product, size, request.quantity)?;
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("product_id", product.id.as_str()), ("size", size.client_form().as_str())],
    );

    Ok(Json(cart.into()))
}

/// Set the quantity of a cart line. Zero removes it.
///
/// Like `add`, a product deleted from the catalog is refused with 400.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<CartLineRequest>,
) -> Result<Json<CartView>> {
    let size = Size::parse(&request.size)?;
    let product_id = ProductId::new(request.product_id);
    let mut cart = load_cart(&session).await?;

    if request.quantity == 0 {
        if !cart.remove(&product_id, size) {
            return Err(AppError::NotFound(format!(
                "{product_id} in size {size} is not in the cart"
            )));
        }
    } else {
        let product = state.catalog().lookup_product(&product_id).await?;
        cart.set_quantity(&product, size, request.quantity)?;
    }

    save_cart(&session, &cart).await?;
    Ok(Json(cart.into()))
}

/// Remove a cart line.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    ApiJson(request): ApiJson<RemoveLineRequest>,
) -> Result<Json<CartView>> {
    let size = Size::parse(&request.size)?;
    let product_id = ProductId::new(request.product_id);

    let mut cart = load_cart(&session).await?;
    if !cart.remove(&product_id, size) {
        return Err(AppError::NotFound(format!(
            "{product_id} in size {size} is not in the cart"
        )));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(cart.into()))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(cart.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_request_defaults_quantity() {
        let request: CartLineRequest =
            serde_json::from_str(r#"{"product_id":"p1","size":"2T"}"#).unwrap();
        assert_eq!(request.quantity, 1);
    }

    #[test]
    fn test_empty_cart_view() {
        let json = serde_json::to_value(CartView::from(Cart::default())).unwrap();
        assert_eq!(json["item_count"], 0);
        assert_eq!(json["items"], serde_json::json!([]));
    }
}
