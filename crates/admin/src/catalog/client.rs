//! Admin catalog client implementation.

use graphql_client::{GraphQLQuery, Response};
use minimoda_core::graphql::ProductInput;
use minimoda_core::graphql::queries::{
    CreateProduct, GetProduct, GetProducts, UpdateProduct, UpdateProductStatus, create_product,
    get_product, get_products, update_product, update_product_status,
};
use minimoda_core::{
    PageRequest, Product, ProductFilter, ProductId, ProductPage, ProductStatus, ValidDraft,
};
use tracing::{debug, instrument};
use url::Url;

use super::{BackendError, GraphQLError};
use crate::models::AdminToken;

/// Client for the catalog GraphQL backend, acting on behalf of an admin.
#[derive(Clone)]
pub struct AdminCatalogClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl std::fmt::Debug for AdminCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCatalogClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl AdminCatalogClient {
    /// Create a new admin catalog client.
    #[must_use]
    pub fn new(endpoint: &Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.clone(),
        }
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL operation with the caller's token.
    async fn execute<Q: GraphQLQuery>(
        &self,
        token: &AdminToken,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, BackendError> {
        let body = Q::build_query(variables);

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(BackendError::Unauthorized(
                "Invalid or expired admin token".to_string(),
            ));
        }

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

        let response: Response<Q::ResponseData> = serde_json::from_str(&response_text)?;

        // Check for GraphQL errors
        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(BackendError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            BackendError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Product methods
    // =========================================================================

    /// Get a product by ID, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the backend has no such product, or an error if
    /// the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        token: &AdminToken,
        id: &ProductId,
    ) -> Result<Product, BackendError> {
        let data = self
            .execute::<GetProduct>(
                token,
                get_product::Variables {
                    id: id.as_str().to_owned(),
                },
            )
            .await?;
        let node = data
            .product
            .ok_or_else(|| BackendError::NotFound(format!("Product not found: {id}")))?;
        Ok(Product::try_from(node)?)
    }

    /// Get a page of products across all statuses unless the filter names one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a product cannot be converted.
    #[instrument(skip(self, token))]
    pub async fn list_products(
        &self,
        token: &AdminToken,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ProductPage, BackendError> {
        let data = self
            .execute::<GetProducts>(token, filter.to_variables(page))
            .await?;
        convert_page(data.products, page)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the input or the request fails.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        token: &AdminToken,
        draft: &ValidDraft,
    ) -> Result<Product, BackendError> {
        let data = self
            .execute::<CreateProduct>(
                token,
                create_product::Variables {
                    input: ProductInput::from(draft),
                },
            )
            .await?;
        Ok(Product::try_from(data.create_product)?)
    }

    /// Replace a product's fields and variants.
    ///
    /// `status` overrides the status derived from the draft.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or an error if the
    /// backend rejects the input.
    #[instrument(skip(self, token, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &AdminToken,
        id: &ProductId,
        draft: &ValidDraft,
        status: ProductStatus,
    ) -> Result<Product, BackendError> {
        let mut input = ProductInput::from(draft);
        status.backend_name().clone_into(&mut input.status);

        let data = self
            .execute::<UpdateProduct>(
                token,
                update_product::Variables {
                    id: id.as_str().to_owned(),
                    input,
                },
            )
            .await?;
        let node = data
            .update_product
            .ok_or_else(|| BackendError::NotFound(format!("Product not found: {id}")))?;
        Ok(Product::try_from(node)?)
    }

    /// Set a product's status. Used for soft delete and restore.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or an error if the
    /// request fails.
    #[instrument(skip(self, token), fields(product_id = %id, status = %status))]
    pub async fn set_status(
        &self,
        token: &AdminToken,
        id: &ProductId,
        status: ProductStatus,
    ) -> Result<Product, BackendError> {
        let data = self
            .execute::<UpdateProductStatus>(
                token,
                update_product_status::Variables {
                    id: id.as_str().to_owned(),
                    status: status.backend_name().to_owned(),
                },
            )
            .await?;
        let node = data
            .update_product_status
            .ok_or_else(|| BackendError::NotFound(format!("Product not found: {id}")))?;
        Ok(Product::try_from(node)?)
    }
}

fn convert_page(
    page: get_products::ProductsPage,
    requested: PageRequest,
) -> Result<ProductPage, BackendError> {
    let products = page
        .items
        .into_iter()
        .map(Product::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProductPage {
        products,
        total: u64::try_from(page.total).unwrap_or(0),
        page: u32::try_from(page.page).unwrap_or(requested.page),
        limit: u32::try_from(page.limit).unwrap_or(requested.limit),
    })
}
