//! Catalog GraphQL backend client (admin privileges).
//!
//! # Security
//!
//! Every call carries the caller's admin token as a bearer token. The admin
//! service never holds a token of its own.
//!
//! # Architecture
//!
//! - Same operations as the storefront, plus the three mutations
//! - No caching: the admin must always see the backend's current state
//! - Deleted products are returned like any other status
//!
//! # Example
//!
//! ```rust,ignore
//! use minimoda_admin::catalog::AdminCatalogClient;
//!
//! let client = AdminCatalogClient::new(&config.api_url);
//! let product = client.set_status(&token, &id, ProductStatus::Deleted).await?;
//! ```

mod client;

pub use client::AdminCatalogClient;

use minimoda_core::graphql::ConversionError;
use thiserror::Error;

/// Errors that can occur when talking to the catalog backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend returned a record the domain cannot represent.
    #[error("Invalid backend data: {0}")]
    Conversion(#[from] ConversionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend rejected the admin token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// A GraphQL error returned by the backend.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl GraphQLError {
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_formatting() {
        let err = BackendError::GraphQL(vec![
            GraphQLError::message("name must not be empty"),
            GraphQLError::message("Forbidden resource"),
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: name must not be empty; Forbidden resource"
        );
    }

    #[test]
    fn test_graphql_error_with_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 3, column: 7 }],
            path: vec![
                serde_json::Value::String("products".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        assert_eq!(
            BackendError::GraphQL(errors).to_string(),
            "GraphQL errors: path: products.0 at line 3:7"
        );
    }

    #[test]
    fn test_graphql_error_empty() {
        assert_eq!(
            BackendError::GraphQL(vec![]).to_string(),
            "GraphQL errors: (no error details provided)"
        );
        assert_eq!(
            BackendError::GraphQL(vec![GraphQLError::message("")]).to_string(),
            "GraphQL errors: [error 1]: (no details)"
        );
    }

    #[test]
    fn test_unauthorized_error() {
        let err = BackendError::Unauthorized("Invalid or expired token".to_string());
        assert_eq!(err.to_string(), "Unauthorized: Invalid or expired token");
    }
}
