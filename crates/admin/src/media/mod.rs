//! Product image hosting on Cloudinary.
//!
//! # Architecture
//!
//! - Uploads go through the admin (`POST /api/uploads`) or straight from the
//!   browser with short-lived signed parameters (`POST /api/uploads/signature`)
//! - The catalog stores only the delivery URL and `public_id`
//! - Replaced images are destroyed once the catalog confirms the update

mod cloudinary;

pub use cloudinary::{
    CloudinaryClient, MAX_UPLOAD_BYTES, SIGNATURE_TTL_SECS, SignedUpload, signature,
    validate_image,
};

use std::str::FromStr;

use thiserror::Error;

/// Errors that can occur when talking to the media host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The media host answered with an error.
    #[error("Media host error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The file was refused before upload (size or type).
    #[error("{0}")]
    Rejected(String),
}

/// Digest used to sign upload parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("expected sha1 or sha256, got {other:?}")),
        }
    }
}
