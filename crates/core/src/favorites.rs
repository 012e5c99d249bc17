//! Favorites (wishlist) state, persisted in the shopper's session.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{Price, ProductId, Size};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub from_price: Option<Price>,
    /// Size the shopper had selected when saving, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl FavoriteItem {
    #[must_use]
    pub fn from_product(product: &Product, size: Option<Size>) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image_url: product.image.as_ref().map(|i| i.url.clone()),
            from_price: product.from_price(),
            size,
        }
    }
}

/// The shopper's favorites, one entry per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites {
    pub items: Vec<FavoriteItem>,
}

impl Favorites {
    /// Save a product. Saving it again refreshes the snapshot and size.
    pub fn add(&mut self, product: &Product, size: Option<Size>) {
        let item = FavoriteItem::from_product(product, size);
        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Remove a product. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != *product_id);
        self.items.len() != before
    }

    /// Add the product if absent, remove it if present.
    ///
    /// Returns `true` if the product is a favorite afterwards.
    pub fn toggle(&mut self, product: &Product, size: Option<Size>) -> bool {
        if self.remove(&product.id) {
            false
        } else {
            self.add(product, size);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|i| i.product_id == *product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
