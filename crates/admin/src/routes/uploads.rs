//! Image upload handlers.

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
};
use chrono::Utc;
use minimoda_core::ImageRef;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::media::{SignedUpload, validate_image};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// An image file read from a multipart request.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl ImageUpload {
    /// Read and check a multipart file field.
    ///
    /// Returns `None` for an empty part (a file input left blank).
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if the part cannot be read, or `Media(Rejected)`
    /// for files that are not images or are too large.
    pub async fn from_field(field: Field<'_>) -> Result<Option<Self>> {
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() && file_name.is_none() {
            return Ok(None);
        }
        validate_image(content_type.as_deref(), bytes.len())?;

        Ok(Some(Self {
            bytes: bytes.to_vec(),
            file_name: file_name.unwrap_or_else(|| "upload".to_string()),
            content_type: content_type.unwrap_or_default(),
        }))
    }

    /// Send the file to the media host.
    ///
    /// # Errors
    ///
    /// Returns the media host's error.
    pub async fn upload(self, state: &AppState) -> Result<ImageRef> {
        Ok(state
            .media()
            .upload(self.bytes, &self.file_name, &self.content_type)
            .await?)
    }
}

pub(crate) fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
}

/// Upload an image through the admin.
///
/// POST /api/uploads (multipart, field `file` or `image`)
#[instrument(skip(state, _auth, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    _auth: RequireAdminAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageRef>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if matches!(field.name(), Some("file" | "image"))
            && let Some(image) = ImageUpload::from_field(field).await?
        {
            let uploaded = image.upload(&state).await?;
            return Ok((StatusCode::CREATED, Json(uploaded)));
        }
    }

    Err(AppError::BadRequest(
        "multipart body has no file or image part".to_string(),
    ))
}

/// Signed parameters for a direct browser upload.
///
/// POST /api/uploads/signature
#[instrument(skip(state, _auth))]
pub async fn signature(
    State(state): State<AppState>,
    _auth: RequireAdminAuth,
) -> Json<SignedUpload> {
    Json(state.media().signed_upload_params(Utc::now()))
}
