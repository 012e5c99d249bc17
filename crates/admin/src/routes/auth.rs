//! Authentication route handlers for admin.
//!
//! Login itself happens on the auth service. The admin UI posts the token
//! it got back here so later requests can use the session cookie instead
//! of carrying the token.

use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{ApiJson, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_stored_auth, get_stored_auth, set_stored_auth};
use crate::models::StoredAuth;
use crate::state::AppState;

/// Token handed over after the redirect login.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

/// Who is logged in.
#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/token",
            get(status).post(store_token).delete(logout),
        )
        .route("/auth/me", get(me))
}

/// Store the token and user profile in the session.
///
/// POST /auth/token
async fn store_token(
    session: Session,
    ApiJson(request): ApiJson<TokenRequest>,
) -> Result<Json<AuthStatus>> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("token cannot be empty".to_string()));
    }

    let auth = StoredAuth {
        token: token.to_owned(),
        user: request.user,
    };
    set_stored_auth(&session, &auth).await?;
    set_sentry_user(auth.user.as_ref());
    tracing::info!("Admin token stored in session");

    Ok(Json(AuthStatus {
        authenticated: true,
        user: auth.user,
    }))
}

/// Whether the session holds a token.
///
/// GET /auth/token
async fn status(session: Session) -> Json<AuthStatus> {
    let auth = get_stored_auth(&session).await;
    Json(AuthStatus {
        authenticated: auth.is_some(),
        user: auth.and_then(|a| a.user),
    })
}

/// The stored user profile.
///
/// GET /auth/me
async fn me(session: Session) -> Result<Json<AuthStatus>> {
    let auth = get_stored_auth(&session)
        .await
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    Ok(Json(AuthStatus {
        authenticated: true,
        user: auth.user,
    }))
}

/// Logout and clear session.
///
/// DELETE /auth/token
async fn logout(session: Session) -> Result<Json<AuthStatus>> {
    clear_stored_auth(&session).await?;
    clear_sentry_user();

    Ok(Json(AuthStatus {
        authenticated: false,
        user: None,
    }))
}
