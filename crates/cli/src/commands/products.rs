//! Product maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! minimoda products list --status deleted
//! minimoda products delete <id>
//! minimoda products restore <id>
//! ```
//!
//! # Environment Variables
//!
//! - `NEST_GRAPHQL_URL` (or `API_URL`) - Catalog GraphQL endpoint
//! - `MINIMODA_ADMIN_TOKEN` - Admin bearer token from the auth service

use minimoda_admin::catalog::{AdminCatalogClient, BackendError};
use minimoda_admin::config::{ConfigError, ENDPOINT_VARS, resolve_endpoint};
use minimoda_admin::models::AdminToken;
use minimoda_core::{FilterError, ListingQuery, Product, ProductId, ProductPage, ProductStatus};
use thiserror::Error;

/// Variable holding the admin token.
pub const TOKEN_VAR: &str = "MINIMODA_ADMIN_TOKEN";

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductsError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn connect() -> Result<(AdminCatalogClient, AdminToken), ProductsError> {
    dotenvy::dotenv().ok();

    let endpoint = resolve_endpoint(&ENDPOINT_VARS, |key| std::env::var(key).ok())?;
    let token = std::env::var(TOKEN_VAR)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or(ProductsError::MissingEnvVar(TOKEN_VAR))?;

    tracing::debug!(endpoint = %endpoint, "Using catalog backend");
    Ok((AdminCatalogClient::new(&endpoint), AdminToken::new(token.trim())))
}

/// List one page of products, all statuses unless `status` is given.
///
/// # Errors
///
/// Returns an error if the filter is invalid or the backend call fails.
pub async fn list(
    status: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<ProductPage, ProductsError> {
    let (filter, page) = ListingQuery {
        status,
        page,
        limit,
        ..ListingQuery::default()
    }
    .parse()?;

    let (client, token) = connect()?;
    Ok(client.list_products(&token, &filter, page).await?)
}

/// Soft delete a product.
///
/// # Errors
///
/// Returns an error if the backend call fails.
pub async fn delete(id: &str) -> Result<Product, ProductsError> {
    let (client, token) = connect()?;
    let product = client
        .set_status(&token, &ProductId::new(id), ProductStatus::Deleted)
        .await?;
    tracing::info!(product_id = %product.id, "Product soft-deleted");
    Ok(product)
}

/// Restore a product to the status its stock implies.
///
/// # Errors
///
/// Returns an error if the product is missing or a backend call fails.
pub async fn restore(id: &str) -> Result<Product, ProductsError> {
    let (client, token) = connect()?;
    let id = ProductId::new(id);

    let current = client.get_product(&token, &id).await?;
    let product = client
        .set_status(&token, &id, current.derived_status())
        .await?;
    tracing::info!(product_id = %product.id, status = %product.status, "Product restored");
    Ok(product)
}
