//! Catalog client implementation.
//!
//! Uses `graphql_client` request/response types with `reqwest` 0.13 for HTTP.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use minimoda_core::graphql::queries::{GetProduct, GetProducts, get_product, get_products};
use minimoda_core::{PageRequest, Product, ProductFilter, ProductId, ProductPage};
use moka::future::Cache;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{BackendError, GraphQLError};

/// Cache lifetime for product detail and unfiltered listings.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Client for the catalog GraphQL backend.
///
/// Product detail and unfiltered listing pages are cached for 5 minutes.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(endpoint: &Url) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.clone(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, BackendError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog backend returned non-success status"
            );
            return Err(BackendError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            ))]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse catalog GraphQL response"
                );
                return Err(BackendError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(BackendError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog response has no data and no errors"
            );
            BackendError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by ID.
    ///
    /// Deleted products are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let product = self.lookup_product(id).await?;
        if product.status.is_deleted() {
            return Err(BackendError::NotFound(format!("Product not found: {id}")));
        }
        Ok(product)
    }

    /// Get a product by ID whatever its status.
    ///
    /// The cart uses this so a deleted product is refused as unavailable
    /// rather than reported missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    pub async fn lookup_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = CacheKey::Product(id.as_str().to_owned());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data = self
            .execute::<GetProduct>(get_product::Variables {
                id: id.as_str().to_owned(),
            })
            .await?;
        let node = data
            .product
            .ok_or_else(|| BackendError::NotFound(format!("Product not found: {id}")))?;
        let product = Product::try_from(node)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Get one page of the public listing.
    ///
    /// Deleted products never appear. Only unfiltered pages are cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a product cannot be converted.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ProductPage, BackendError> {
        let cacheable = filter.clone().normalized().is_empty();
        let cache_key = CacheKey::listing(page);

        if cacheable
            && let Some(CacheValue::Listing(listing)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for listing");
            return Ok(listing);
        }

        let data = self
            .execute::<GetProducts>(filter.to_variables(page))
            .await?;
        let listing = public_page(data.products, page)?;

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Listing(listing.clone()))
                .await;
        }

        Ok(listing)
    }
}

/// Convert a backend page, dropping deleted products.
///
/// `total` stays the backend count so paging reaches every backend page,
/// even one made up entirely of deleted rows.
fn public_page(
    page: get_products::ProductsPage,
    requested: PageRequest,
) -> Result<ProductPage, BackendError> {
    let mut products = Vec::with_capacity(page.items.len());
    for node in page.items {
        let product = Product::try_from(node)?;
        if !product.status.is_deleted() {
            products.push(product);
        }
    }

    Ok(ProductPage {
        products,
        total: u64::try_from(page.total).unwrap_or(0),
        page: u32::try_from(page.page).unwrap_or(requested.page),
        limit: u32::try_from(page.limit).unwrap_or(requested.limit),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn backend_page(statuses: &[&str]) -> get_products::ProductsPage {
        let items = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                serde_json::from_value(serde_json::json!({
                    "id": i.to_string(),
                    "name": "Vestido",
                    "genre": "GIRL",
                    "status": status,
                    "variants": [{ "talla": "T4", "stock": 1, "price": 25.0 }]
                }))
                .unwrap()
            })
            .collect();
        get_products::ProductsPage {
            items,
            total: 10,
            page: 1,
            limit: 12,
        }
    }

    #[test]
    fn test_public_page_hides_deleted() {
        let page = public_page(
            backend_page(&["AVAILABLE", "DELETED", "SOLD_OUT"]),
            PageRequest::default(),
        )
        .unwrap();
        assert_eq!(page.products.len(), 2);
        assert_eq!(page.total, 10);
        assert!(page.products.iter().all(|p| !p.status.is_deleted()));
    }

    #[test]
    fn test_public_page_keeps_paging_past_deleted_rows() {
        let mut raw = backend_page(&["DELETED"; 12]);
        raw.total = 13;
        let page = public_page(raw, PageRequest::default()).unwrap();
        assert!(page.products.is_empty());
        assert_eq!(page.total_pages(), 2);
        assert!(page.has_next());
    }

    #[test]
    fn test_public_page_rejects_bad_nodes() {
        let mut raw = backend_page(&["AVAILABLE"]);
        raw.items[0].genre = "ADULT".to_string();
        assert!(matches!(
            public_page(raw, PageRequest::default()),
            Err(BackendError::Conversion(_))
        ));
    }
}
