//! Product management route handlers.
//!
//! Creates and updates accept JSON or multipart. Delete and restore go
//! through the server-held list view so the UI sees them immediately.

use axum::{
    Json,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{StatusCode, header},
};
use minimoda_core::{
    Genre, ImageRef, ListingQuery, Price, Product, ProductDraft, ProductId, ProductPage,
    ProductStatus, Size, ValidDraft, Variant,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::uploads::{ImageUpload, multipart_error};
use crate::error::{ApiQuery, AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::services::ViewSnapshot;
use crate::state::AppState;

// =============================================================================
// Submission
// =============================================================================

/// Product fields as submitted by the admin UI.
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub genre: String,
    pub variants: Vec<VariantInput>,
    /// Image already on the media host (from a direct upload).
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// One variant row from the form.
#[derive(Debug, Deserialize)]
pub struct VariantInput {
    #[serde(alias = "talla")]
    pub size: String,
    pub stock: i64,
    /// Number or decimal string.
    pub price: serde_json::Value,
}

impl VariantInput {
    fn into_variant(self) -> Result<Variant> {
        let size = Size::parse(&self.size).map_err(|e| AppError::Validation(e.to_string()))?;
        let stock = u32::try_from(self.stock).map_err(|_| {
            AppError::Validation(format!(
                "stock for size {size} must be a non-negative whole number (got {})",
                self.stock
            ))
        })?;
        let raw_price = match &self.price {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(AppError::Validation(format!(
                    "price for size {size} must be a number (got {other})"
                )));
            }
        };
        let price = Price::parse(&raw_price)
            .map_err(|e| AppError::Validation(format!("price for size {size}: {e}")))?;

        Ok(Variant::new(size, stock, price))
    }
}

impl SubmissionFields {
    /// Check every field and derive the status from stock.
    ///
    /// # Errors
    ///
    /// Returns `Validation` describing the first problem found.
    pub fn validate(self) -> Result<ValidDraft> {
        let genre = Genre::parse(&self.genre).map_err(|e| AppError::Validation(e.to_string()))?;
        let variants = self
            .variants
            .into_iter()
            .map(VariantInput::into_variant)
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductDraft {
            name: self.name,
            description: self.description,
            genre,
            variants,
            image: self.image,
        }
        .validate()?)
    }
}

/// A create or update request, from JSON or multipart.
///
/// In multipart, `name`, `description` and `genre` are text parts,
/// `variants` is a JSON text part and `image` is an optional file.
#[derive(Debug)]
pub struct ProductSubmission {
    pub fields: SubmissionFields,
    pub image: Option<ImageUpload>,
}

impl<S> FromRequest<S> for ProductSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else {
            let Json(fields) = Json::<SubmissionFields>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self {
                fields,
                image: None,
            })
        }
    }
}

impl ProductSubmission {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut fields = SubmissionFields::default();
        let mut saw_variants = false;
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "image" => image = ImageUpload::from_field(field).await?,
                "name" => fields.name = field.text().await.map_err(multipart_error)?,
                "description" => fields.description = field.text().await.map_err(multipart_error)?,
                "genre" => fields.genre = field.text().await.map_err(multipart_error)?,
                "variants" => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    fields.variants = serde_json::from_str(&raw).map_err(|e| {
                        AppError::Validation(format!("variants must be a JSON array: {e}"))
                    })?;
                    saw_variants = true;
                }
                _ => {}
            }
        }

        if !saw_variants {
            return Err(AppError::Validation(
                "a product needs at least one variant".to_string(),
            ));
        }

        Ok(Self { fields, image })
    }
}

// =============================================================================
// Responses
// =============================================================================

/// One page of the admin listing.
#[derive(Debug, Serialize)]
pub struct AdminListingResponse {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next: bool,
}

impl From<ProductPage> for AdminListingResponse {
    fn from(page: ProductPage) -> Self {
        Self {
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(),
            has_next: page.has_next(),
            products: page.products,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List products of every status unless the query names one.
///
/// GET /api/products
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> Result<Json<AdminListingResponse>> {
    let (filter, page) = query.parse()?;
    let listing = state.catalog().list_products(&auth, &filter, page).await?;
    Ok(Json(listing.into()))
}

/// Show a product, deleted or not.
///
/// GET /api/products/{id}
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = state.catalog().get_product(&auth, &ProductId::new(id)).await?;
    Ok(Json(product))
}

/// Create a product.
///
/// POST /api/products
#[instrument(skip(state, auth, submission))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    submission: ProductSubmission,
) -> Result<(StatusCode, Json<Product>)> {
    let mut draft = submission.fields.validate()?;
    let uploaded = attach_upload(&state, &mut draft, submission.image).await?;

    match state.catalog().create_product(&auth, &draft).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, status = %product.status, "Product created");
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(e) => {
            discard_upload(&state, uploaded.as_ref()).await;
            Err(e.into())
        }
    }
}

/// Replace a product's fields and variants.
///
/// A soft-deleted product stays deleted; anything else gets the status its
/// stock implies.
///
/// PUT /api/products/{id}
#[instrument(skip(state, auth, submission))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    Path(id): Path<String>,
    submission: ProductSubmission,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    let mut draft = submission.fields.validate()?;
    let current = state.catalog().get_product(&auth, &id).await?;

    let uploaded = attach_upload(&state, &mut draft, submission.image).await?;
    if draft.image.is_none() {
        draft.image.clone_from(&current.image);
    }
    let status = if current.status.is_deleted() {
        ProductStatus::Deleted
    } else {
        draft.status
    };

    let updated = match state
        .catalog()
        .update_product(&auth, &id, &draft, status)
        .await
    {
        Ok(product) => product,
        Err(e) => {
            discard_upload(&state, uploaded.as_ref()).await;
            return Err(e.into());
        }
    };

    if let Some(old) = replaced_image(current.image.as_ref(), updated.image.as_ref()) {
        discard_upload(&state, Some(old)).await;
    }
    state.products().record(updated.clone()).await;

    Ok(Json(updated))
}

/// Soft delete a product.
///
/// DELETE /api/products/{id}
#[instrument(skip(state, auth))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = state
        .products()
        .soft_delete(&auth, &ProductId::new(id))
        .await?;
    Ok(Json(product))
}

/// Restore a soft-deleted product.
///
/// POST /api/products/{id}/restore
#[instrument(skip(state, auth))]
pub async fn restore(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let product = state.products().restore(&auth, &ProductId::new(id)).await?;
    Ok(Json(product))
}

/// Current list view.
///
/// GET /api/products/view
pub async fn view(
    State(state): State<AppState>,
    _auth: RequireAdminAuth,
) -> Json<ViewSnapshot> {
    Json(state.products().snapshot().await)
}

/// Refetch the list view. A newer refresh cancels this one (409).
///
/// POST /api/products/view/refresh
#[instrument(skip(state, auth))]
pub async fn refresh(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> Result<Json<ViewSnapshot>> {
    let (filter, page) = query.parse()?;
    let snapshot = state.products().refresh(&auth, filter, page).await?;
    Ok(Json(snapshot))
}

// =============================================================================
// Helpers
// =============================================================================

/// Upload the submitted file, if any, and point the draft at it.
async fn attach_upload(
    state: &AppState,
    draft: &mut ValidDraft,
    image: Option<ImageUpload>,
) -> Result<Option<ImageRef>> {
    let Some(image) = image else {
        return Ok(None);
    };
    let uploaded = image.upload(state).await?;
    draft.image = Some(uploaded.clone());
    Ok(Some(uploaded))
}

/// Best-effort removal of an image the catalog no longer references.
async fn discard_upload(state: &AppState, image: Option<&ImageRef>) {
    let Some(image) = image.filter(|i| !i.public_id.is_empty()) else {
        return;
    };
    if let Err(e) = state.media().destroy(&image.public_id).await {
        warn!(public_id = %image.public_id, error = %e, "Failed to destroy image");
    }
}

/// The previous image, when an update replaced it with a different one.
fn replaced_image<'a>(old: Option<&'a ImageRef>, new: Option<&ImageRef>) -> Option<&'a ImageRef> {
    let old = old?;
    match new {
        Some(new) if new.public_id == old.public_id => None,
        _ => Some(old),
    }
}
