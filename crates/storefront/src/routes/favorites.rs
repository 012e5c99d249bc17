//! Favorites route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use minimoda_core::{Favorites, ProductId, Size};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{ApiJson, AppError, Result};
use crate::models::{self, session_keys};
use crate::state::AppState;

/// Save or toggle a favorite.
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub product_id: String,
    #[serde(default)]
    pub size: Option<String>,
}

/// Result of a toggle.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub favorite: bool,
    pub favorites: Favorites,
}

async fn load_favorites(session: &Session) -> Result<Favorites> {
    Ok(models::load(session, session_keys::FAVORITES).await?)
}

async fn save_favorites(session: &Session, favorites: &Favorites) -> Result<()> {
    Ok(models::store(session, session_keys::FAVORITES, favorites).await?)
}

fn parse_size(size: Option<&str>) -> Result<Option<Size>> {
    size.filter(|s| !s.trim().is_empty())
        .map(Size::parse)
        .transpose()
        .map_err(AppError::from)
}

/// List favorites.
#[instrument(skip(session))]
pub async fn index(session: Session) -> Result<Json<Favorites>> {
    Ok(Json(load_favorites(&session).await?))
}

/// Save a product as a favorite.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<FavoriteRequest>,
) -> Result<Json<Favorites>> {
    let size = parse_size(request.size.as_deref())?;
    let product = state
        .catalog()
        .get_product(&ProductId::new(request.product_id))
        .await?;

    let mut favorites = load_favorites(&session).await?;
    favorites.add(&product, size);
    save_favorites(&session, &favorites).await?;

    Ok(Json(favorites))
}

/// Add the product if it is not a favorite yet, remove it otherwise.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<FavoriteRequest>,
) -> Result<Json<ToggleResponse>> {
    let size = parse_size(request.size.as_deref())?;
    let product_id = ProductId::new(request.product_id);
    let mut favorites = load_favorites(&session).await?;

    // Removing never needs the catalog, so a product deleted since it was
    // saved can still be un-favorited.
    let favorite = if favorites.remove(&product_id) {
        false
    } else {
        let product = state.catalog().get_product(&product_id).await?;
        favorites.toggle(&product, size)
    };
    save_favorites(&session, &favorites).await?;

    Ok(Json(ToggleResponse {
        favorite,
        favorites,
    }))
}

/// Remove a favorite.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(product_id): Path<String>) -> Result<Json<Favorites>> {
    let product_id = ProductId::new(product_id);
    let mut favorites = load_favorites(&session).await?;
    if !favorites.remove(&product_id) {
        return Err(AppError::NotFound(format!("{product_id} is not a favorite")));
    }
    save_favorites(&session, &favorites).await?;
    Ok(Json(favorites))
}
