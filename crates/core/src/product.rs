//! Products and their per-size variants.
//!
//! A product's status is never edited directly. It is derived from the sum
//! of its variant stock whenever variants are submitted, except that a
//! soft-deleted product stays deleted until it is explicitly restored.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Genre, Price, ProductId, ProductStatus, Size};

/// Validation errors for product submissions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("product name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("a product needs at least one variant")]
    NoVariants,
    #[error("size {0} appears more than once")]
    DuplicateSize(Size),
    #[error("invalid variant: {0}")]
    InvalidVariant(String),
}

/// Stock and price for one size of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub size: Size,
    pub stock: u32,
    pub price: Price,
}

impl Variant {
    #[must_use]
    pub const fn new(size: Size, stock: u32, price: Price) -> Self {
        Self { size, stock, price }
    }
}

/// Reference to an image on the media host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Public delivery URL.
    pub url: String,
    /// Identifier used to delete the asset from the media host.
    pub public_id: String,
}

/// A product from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub genre: Genre,
    pub status: ProductStatus,
    pub image: Option<ImageRef>,
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Sum of stock across all variants.
    #[must_use]
    pub fn total_stock(&self) -> u64 {
        total_stock(&self.variants)
    }

    /// Lowest variant price, shown as the "from" price in listings.
    #[must_use]
    pub fn from_price(&self) -> Option<Price> {
        self.variants.iter().map(|v| v.price).min()
    }

    /// Variant offered for a size, if any.
    #[must_use]
    pub fn variant(&self, size: Size) -> Option<&Variant> {
        self.variants.iter().find(|v| v.size == size)
    }

    /// Whether the size is offered and has stock.
    #[must_use]
    pub fn in_stock(&self, size: Size) -> bool {
        self.variant(size).is_some_and(|v| v.stock > 0)
    }

    /// Status implied by the current variants, ignoring soft delete.
    #[must_use]
    pub fn derived_status(&self) -> ProductStatus {
        ProductStatus::from_total_stock(self.total_stock())
    }

    /// Sizes offered, in chart order.
    #[must_use]
    pub fn sizes(&self) -> Vec<Size> {
        let mut sizes: Vec<Size> = self.variants.iter().map(|v| v.size).collect();
        sizes.sort();
        sizes
    }
}

/// Sum of stock across variants.
#[must_use]
pub fn total_stock(variants: &[Variant]) -> u64 {
    variants.iter().map(|v| u64::from(v.stock)).sum()
}

/// Check the variant invariants and return the variants in chart order.
///
/// # Errors
///
/// Returns [`ProductError::NoVariants`] for an empty list and
/// [`ProductError::DuplicateSize`] if a size appears twice.
pub fn validate_variants(mut variants: Vec<Variant>) -> Result<Vec<Variant>, ProductError> {
    if variants.is_empty() {
        return Err(ProductError::NoVariants);
    }

    let mut seen = HashSet::with_capacity(variants.len());
    for variant in &variants {
        if !seen.insert(variant.size) {
            return Err(ProductError::DuplicateSize(variant.size));
        }
    }

    variants.sort_by_key(|v| v.size);
    Ok(variants)
}

/// A product as submitted from the admin surface, before it reaches the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub genre: Genre,
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl ProductDraft {
    pub const MAX_NAME_LENGTH: usize = 200;

    /// Validate and normalize the draft.
    ///
    /// Trims text fields, enforces the variant invariants and sorts variants
    /// into chart order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductError`] found.
    pub fn validate(self) -> Result<ValidDraft, ProductError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(ProductError::NameTooLong {
                max: Self::MAX_NAME_LENGTH,
            });
        }

        let variants = validate_variants(self.variants)?;
        let status = ProductStatus::from_total_stock(total_stock(&variants));

        Ok(ValidDraft {
            name,
            description: self.description.trim().to_owned(),
            genre: self.genre,
            status,
            variants,
            image: self.image,
        })
    }
}

/// A draft that passed validation, with its status derived from stock.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub name: String,
    pub description: String,
    pub genre: Genre,
    pub status: ProductStatus,
    pub variants: Vec<Variant>,
    pub image: Option<ImageRef>,
}
