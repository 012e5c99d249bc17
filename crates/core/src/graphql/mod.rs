//! Wire types for the catalog GraphQL backend.
//!
//! The backend speaks camelCase JSON, stores sizes in backend form
//! (`M3`, `T2`) and uses SCREAMING enum values. Everything in here stays
//! stringly typed; [`ProductNode`] is converted into a domain
//! [`Product`] at the edge, where bad sizes and unknown enum values are
//! rejected instead of leaking into the domain.

pub mod queries;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::{ImageRef, Product, ValidDraft, Variant};
use crate::types::{Genre, GenreError, Price, PriceError, ProductId, ProductStatus, Size, SizeError};

/// Errors converting backend payloads into domain types.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("product {id}: {source}")]
    Size {
        id: String,
        #[source]
        source: SizeError,
    },
    #[error("product {id}: {source}")]
    Genre {
        id: String,
        #[source]
        source: GenreError,
    },
    #[error("product {id}: unknown status {status:?}")]
    Status { id: String, status: String },
    #[error("product {id}: negative stock {stock} for size {talla}")]
    NegativeStock { id: String, talla: String, stock: i64 },
    #[error("product {id}: {source}")]
    Price {
        id: String,
        #[source]
        source: PriceError,
    },
}

/// Product as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub genre: String,
    pub status: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_public_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub variants: Vec<VariantNode>,
}

/// Variant as returned by the backend and sent in inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantNode {
    pub talla: String,
    pub stock: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Input payload for create and update mutations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub genre: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_public_id: Option<String>,
    pub variants: Vec<VariantNode>,
}

impl From<&Variant> for VariantNode {
    fn from(variant: &Variant) -> Self {
        Self {
            talla: variant.size.backend_form(),
            stock: i64::from(variant.stock),
            price: variant.price.amount(),
        }
    }
}

impl From<&ValidDraft> for ProductInput {
    fn from(draft: &ValidDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            genre: draft.genre.backend_name().to_owned(),
            status: draft.status.backend_name().to_owned(),
            image_url: draft.image.as_ref().map(|i| i.url.clone()),
            image_public_id: draft.image.as_ref().map(|i| i.public_id.clone()),
            variants: draft.variants.iter().map(VariantNode::from).collect(),
        }
    }
}

impl VariantNode {
    fn into_variant(self, product_id: &str) -> Result<Variant, ConversionError> {
        let size = Size::parse(&self.talla).map_err(|source| ConversionError::Size {
            id: product_id.to_owned(),
            source,
        })?;
        let stock = u32::try_from(self.stock).map_err(|_| ConversionError::NegativeStock {
            id: product_id.to_owned(),
            talla: self.talla.clone(),
            stock: self.stock,
        })?;
        let price = Price::new(self.price).map_err(|source| ConversionError::Price {
            id: product_id.to_owned(),
            source,
        })?;
        Ok(Variant::new(size, stock, price))
    }
}

impl TryFrom<ProductNode> for Product {
    type Error = ConversionError;

    fn try_from(node: ProductNode) -> Result<Self, Self::Error> {
        let genre = Genre::parse(&node.genre).map_err(|source| ConversionError::Genre {
            id: node.id.clone(),
            source,
        })?;
        let status = ProductStatus::parse(&node.status).ok_or_else(|| ConversionError::Status {
            id: node.id.clone(),
            status: node.status.clone(),
        })?;

        let mut variants = node
            .variants
            .into_iter()
            .map(|v| v.into_variant(&node.id))
            .collect::<Result<Vec<_>, _>>()?;
        variants.sort_by_key(|v| v.size);

        let image = match (node.image_url, node.image_public_id) {
            (Some(url), Some(public_id)) if !url.is_empty() => Some(ImageRef { url, public_id }),
            (Some(url), None) if !url.is_empty() => Some(ImageRef {
                url,
                public_id: String::new(),
            }),
            _ => None,
        };

        Ok(Self {
            id: ProductId::new(node.id),
            name: node.name,
            description: node.description.unwrap_or_default(),
            genre,
            status,
            image,
            variants,
            created_at: node.created_at,
        })
    }
}
