//! Image upload commands.
//!
//! # Usage
//!
//! ```bash
//! minimoda upload sign
//! minimoda upload image ./enterito.jpg
//! ```
//!
//! # Environment Variables
//!
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
//! - `CLOUDINARY_UPLOAD_FOLDER`, `CLOUDINARY_SIGNATURE_ALGORITHM` (optional)

use std::path::Path;

use chrono::Utc;
use minimoda_admin::config::{CloudinaryConfig, ConfigError};
use minimoda_admin::media::{CloudinaryClient, MediaError, SignedUpload};
use minimoda_core::ImageRef;
use thiserror::Error;

/// Errors that can occur during upload operations.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image type: {0} (use jpg, png, webp, gif or avif)")]
    UnsupportedType(String),

    #[error(transparent)]
    Media(#[from] MediaError),
}

fn client() -> Result<CloudinaryClient, UploadError> {
    dotenvy::dotenv().ok();
    Ok(CloudinaryClient::new(CloudinaryConfig::from_env()?))
}

/// Content type implied by a file extension.
///
/// # Errors
///
/// Returns `UnsupportedType` for anything that is not a common web image.
pub fn content_type_for(path: &Path) -> Result<&'static str, UploadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        "gif" => Ok("image/gif"),
        "avif" => Ok("image/avif"),
        _ => Err(UploadError::UnsupportedType(path.display().to_string())),
    }
}

/// Signed parameters for a direct upload, valid for an hour.
///
/// # Errors
///
/// Returns an error if the media host settings are missing or invalid.
pub fn sign() -> Result<SignedUpload, UploadError> {
    Ok(client()?.signed_upload_params(Utc::now()))
}

/// Upload a local image file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not an image, or the
/// media host refuses it.
pub async fn image(path: &Path) -> Result<ImageRef, UploadError> {
    let content_type = content_type_for(path)?;
    let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    tracing::info!(file = file_name, bytes = bytes.len(), "Uploading image");
    Ok(client()?.upload(bytes, file_name, content_type).await?)
}
