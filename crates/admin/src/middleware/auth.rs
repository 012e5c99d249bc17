//! Authentication extractors for admin.
//!
//! An admin token comes from an `Authorization: Bearer` header (CLI and
//! scripts) or from the auth blob stored in the session (the admin UI).
//! The header wins when both are present.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{AdminToken, StoredAuth, session_keys};

/// Extractor that requires an admin token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(token): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     client.list_products(&token, ...).await
/// }
/// ```
pub struct RequireAdminAuth(pub AdminToken);

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(parts) {
            return Ok(Self(AdminToken::new(token)));
        }

        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

        let auth = get_stored_auth(session)
            .await
            .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

        Ok(Self(AdminToken::new(auth.token)))
    }
}

/// Extract a non-empty bearer token from the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Read the auth blob from the session.
pub async fn get_stored_auth(session: &Session) -> Option<StoredAuth> {
    session
        .get::<StoredAuth>(session_keys::AUTH)
        .await
        .ok()
        .flatten()
        .filter(|auth| !auth.token.trim().is_empty())
}

/// Helper to store the auth blob in the session.
///
/// The session ID is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_stored_auth(
    session: &Session,
    auth: &StoredAuth,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::AUTH, auth).await
}

/// Helper to clear the auth blob from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_stored_auth(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<StoredAuth>(session_keys::AUTH).await?;
    Ok(())
}
