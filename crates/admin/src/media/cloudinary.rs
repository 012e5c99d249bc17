//! Cloudinary upload API client.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use minimoda_core::ImageRef;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use tracing::{instrument, warn};

use super::{MediaError, SignatureAlgorithm};
use crate::config::CloudinaryConfig;

/// Largest image accepted for upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How long signed upload parameters stay valid.
pub const SIGNATURE_TTL_SECS: i64 = 3600;

/// Parameters that are sent with an upload but never signed.
const UNSIGNED_PARAMS: &[&str] = &["file", "api_key", "resource_type", "cloud_name"];

/// Compute the request signature for a set of upload parameters.
///
/// Parameters are sorted by key and joined as `k=v&k=v`, the API secret is
/// appended, and the result is hex-digested.
#[must_use]
pub fn signature(
    params: &BTreeMap<String, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let to_sign = params
        .iter()
        .filter(|(key, value)| !UNSIGNED_PARAMS.contains(&key.as_str()) && !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let payload = format!("{to_sign}{api_secret}");

    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}

/// Refuse files that are too large or not images.
///
/// # Errors
///
/// Returns [`MediaError::Rejected`] describing the problem.
pub fn validate_image(content_type: Option<&str>, len: usize) -> Result<(), MediaError> {
    if len == 0 {
        return Err(MediaError::Rejected("image file is empty".to_string()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(MediaError::Rejected(format!(
            "image is {len} bytes, the limit is {MAX_UPLOAD_BYTES} bytes"
        )));
    }
    match content_type {
        Some(ct) if ct.trim().to_ascii_lowercase().starts_with("image/") => Ok(()),
        Some(ct) => Err(MediaError::Rejected(format!(
            "only images can be uploaded (got {ct})"
        ))),
        None => Err(MediaError::Rejected(
            "only images can be uploaded (missing content type)".to_string(),
        )),
    }
}

/// Signed parameters for a direct browser upload.
#[derive(Debug, Clone, Serialize)]
pub struct SignedUpload {
    pub upload_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub folder: String,
    pub timestamp: i64,
    pub signature: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the Cloudinary upload API.
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    #[must_use]
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{action}",
            self.config.api_base.as_str().trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    fn sign(&self, params: &BTreeMap<String, String>) -> String {
        signature(
            params,
            self.config.api_secret.expose_secret(),
            self.config.signature_algorithm,
        )
    }

    /// Sign upload parameters for a browser upload starting at `now`.
    #[must_use]
    pub fn signed_upload_params(&self, now: DateTime<Utc>) -> SignedUpload {
        let timestamp = now.timestamp();
        let params = BTreeMap::from([
            ("folder".to_string(), self.config.upload_folder.clone()),
            ("timestamp".to_string(), timestamp.to_string()),
        ]);

        SignedUpload {
            upload_url: self.endpoint("upload"),
            cloud_name: self.config.cloud_name.clone(),
            api_key: self.config.api_key.clone(),
            folder: self.config.upload_folder.clone(),
            timestamp,
            signature: self.sign(&params),
            expires_at: now + TimeDelta::seconds(SIGNATURE_TTL_SECS),
        }
    }

    /// Upload an image and return its delivery reference.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if the file fails [`validate_image`], or an error
    /// if the media host refuses the upload.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<ImageRef, MediaError> {
        validate_image(Some(content_type), bytes.len())?;

        let timestamp = Utc::now().timestamp().to_string();
        let params = BTreeMap::from([
            ("folder".to_string(), self.config.upload_folder.clone()),
            ("timestamp".to_string(), timestamp.clone()),
        ]);
        let signature = self.sign(&params);

        let file = Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.upload_folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let uploaded: UploadResponse = parse_response(response).await?;
        tracing::info!(public_id = %uploaded.public_id, "Image uploaded");

        Ok(ImageRef {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    /// Delete an image. Returns `false` if the media host did not have it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the media host refuses it.
    #[instrument(skip(self))]
    pub async fn destroy(&self, public_id: &str) -> Result<bool, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let params = BTreeMap::from([
            ("public_id".to_string(), public_id.to_owned()),
            ("timestamp".to_string(), timestamp.clone()),
        ]);
        let signature = self.sign(&params);

        let form = [
            ("public_id", public_id.to_owned()),
            ("timestamp", timestamp),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
        ];

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?;

        let destroyed: DestroyResponse = parse_response(response).await?;
        match destroyed.result.as_str() {
            "ok" => Ok(true),
            "not found" => {
                warn!(public_id, "Image to destroy was not found on the media host");
                Ok(false)
            }
            other => Err(MediaError::Api {
                status: 200,
                message: format!("unexpected destroy result: {other}"),
            }),
        }
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, MediaError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        return Err(MediaError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use url::Url;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn client(algorithm: SignatureAlgorithm) -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "minimoda".to_string(),
            api_key: "123456789012345".to_string(),
            api_secret: SecretString::from("abcd"),
            upload_folder: "minimoda/products".to_string(),
            signature_algorithm: algorithm,
            api_base: Url::parse("https://api.cloudinary.com").unwrap(),
        })
    }

    #[test]
    fn test_signature_matches_published_example() {
        // Worked example from the Cloudinary signing documentation
        let signed = signature(
            &params(&[
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
                ("public_id", "sample_image"),
                ("timestamp", "1315060510"),
            ]),
            "abcd",
            SignatureAlgorithm::Sha1,
        );
        assert_eq!(signed, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn test_signature_is_deterministic_and_ignores_unsigned_params() {
        let base = params(&[("folder", "minimoda/products"), ("timestamp", "1700000000")]);
        let mut with_extras = base.clone();
        with_extras.insert("api_key".to_string(), "123".to_string());
        with_extras.insert("file".to_string(), "data:...".to_string());
        with_extras.insert("cloud_name".to_string(), "minimoda".to_string());
        with_extras.insert("resource_type".to_string(), "image".to_string());

        let a = signature(&base, "s3cr3t", SignatureAlgorithm::Sha256);
        let b = signature(&with_extras, "s3cr3t", SignatureAlgorithm::Sha256);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, signature(&base, "other", SignatureAlgorithm::Sha256));
    }

    #[test]
    fn test_signed_upload_expires_after_an_hour() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let signed = client(SignatureAlgorithm::Sha1).signed_upload_params(now);

        assert_eq!(signed.timestamp, 1_700_000_000);
        assert_eq!((signed.expires_at - now).num_seconds(), SIGNATURE_TTL_SECS);
        assert_eq!(signed.signature.len(), 40);
        assert_eq!(
            signed.upload_url,
            "https://api.cloudinary.com/v1_1/minimoda/image/upload"
        );
        assert_eq!(
            signed.signature,
            signature(
                &params(&[("folder", "minimoda/products"), ("timestamp", "1700000000")]),
                "abcd",
                SignatureAlgorithm::Sha1
            )
        );
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image(Some("image/png"), 1024).is_ok());
        assert!(validate_image(Some("IMAGE/JPEG"), MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            validate_image(Some("image/png"), MAX_UPLOAD_BYTES + 1),
            Err(MediaError::Rejected(_))
        ));
        assert!(matches!(
            validate_image(Some("application/pdf"), 10),
            Err(MediaError::Rejected(_))
        ));
        assert!(validate_image(None, 10).is_err());
        assert!(validate_image(Some("image/png"), 0).is_err());
    }
}
