//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use minimoda_core::{
    ListingQuery, ListingState, Price, Product, ProductFilter, ProductId, ProductPage, Size,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{ApiQuery, AppError, Result};
use crate::models::{self, session_keys};
use crate::state::AppState;

/// Product as shown to shoppers.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub from_price: Option<Price>,
    pub total_stock: u64,
    /// Sizes with stock on hand, in chart order.
    pub sizes_in_stock: Vec<Size>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let sizes_in_stock = product
            .sizes()
            .into_iter()
            .filter(|size| product.in_stock(*size))
            .collect();
        Self {
            from_price: product.from_price(),
            total_stock: product.total_stock(),
            sizes_in_stock,
            product,
        }
    }
}

/// One page of the listing plus the filter that produced it.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub products: Vec<ProductView>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next: bool,
    pub filter: ProductFilter,
}

impl ListingResponse {
    fn new(page: ProductPage, filter: ProductFilter) -> Self {
        Self {
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(),
            has_next: page.has_next(),
            products: page.products.into_iter().map(ProductView::from).collect(),
            filter,
        }
    }
}

/// List products.
///
/// The filter is remembered in the session; changing it sends the listing
/// back to page 1.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> Result<Json<ListingResponse>> {
    let (filter, requested) = query.parse()?;
    if filter.status.is_some_and(|s| s.is_deleted()) {
        return Err(AppError::BadRequest(
            "deleted products are not listed".to_string(),
        ));
    }

    let mut listing: ListingState = models::load(&session, session_keys::LISTING).await?;
    let page = listing.apply(filter, requested);
    models::store(&session, session_keys::LISTING, &listing).await?;

    let products = state.catalog().get_products(&listing.filter, page).await?;
    Ok(Json(ListingResponse::new(products, listing.filter)))
}

/// Show a single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state.catalog().get_product(&ProductId::new(id)).await?;
    Ok(Json(product.into()))
}

/// The size chart in display order (client form).
pub async fn sizes() -> Json<Vec<Size>> {
    Json(Size::ALL.to_vec())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use minimoda_core::{Genre, ProductStatus, Variant};

    use super::*;

    #[test]
    fn test_product_view_lists_sizes_in_stock() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Enterito".to_string(),
            description: String::new(),
            genre: Genre::Unisex,
            status: ProductStatus::Available,
            image: None,
            variants: vec![
                Variant::new(Size::M12, 0, Price::parse("30").unwrap()),
                Variant::new(Size::M3, 2, Price::parse("25").unwrap()),
            ],
            created_at: None,
        };

        let json = serde_json::to_value(ProductView::from(product)).unwrap();
        assert_eq!(json["sizes_in_stock"], serde_json::json!(["3M"]));
        assert_eq!(json["total_stock"], 2);
        assert_eq!(json["name"], "Enterito");
    }
}
