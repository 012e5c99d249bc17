//! Shopping cart state.
//!
//! The cart lives in the shopper's session, not in the backend. Each line
//! keeps a snapshot of the product it was added from so the cart can be
//! shown without refetching every product. Lines are keyed by
//! `(product_id, size)`.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{Price, ProductId, Size};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("product {0} is not for sale")]
    Unavailable(ProductId),
    #[error("product {product_id} does not come in size {size}")]
    SizeNotOffered { product_id: ProductId, size: Size },
    #[error("only {available} left in size {size}")]
    OutOfStock { size: Size, available: u32 },
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("product {product_id} in size {size} is not in the cart")]
    NotInCart { product_id: ProductId, size: Size },
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub size: Size,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    fn matches(&self, product_id: &ProductId, size: Size) -> bool {
        self.product_id == *product_id && self.size == size
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Add `quantity` units of a product in a size.
    ///
    /// Adding a line that already exists merges the quantities; the merged
    /// quantity is clamped to the stock on hand. The product snapshot is
    /// refreshed from `product` either way.
    ///
    /// # Errors
    ///
    /// Fails if the product is deleted, the size isn't offered, the
    /// quantity is zero, or the requested quantity alone exceeds stock.
    pub fn add(
        &mut self,
        product: &Product,
        size: Size,
        quantity: u32,
    ) -> Result<&CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let variant = sellable_variant(product, size)?;
        if quantity > variant.stock {
            return Err(CartError::OutOfStock {
                size,
                available: variant.stock,
            });
        }

        let image_url = product.image.as_ref().map(|i| i.url.clone());
        if let Some(item) = self.line_mut(&product.id, size) {
            item.quantity = item.quantity.saturating_add(quantity).min(variant.stock);
            item.unit_price = variant.price;
            item.name.clone_from(&product.name);
            item.image_url = image_url;
        } else {
            self.items.push(CartItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                image_url,
                size,
                unit_price: variant.price,
                quantity,
            });
        }

        self.items
            .iter()
            .find(|i| i.matches(&product.id, size))
            .ok_or_else(|| CartError::NotInCart {
                product_id: product.id.clone(),
                size,
            })
    }

    /// Set the quantity of an existing line. A quantity of zero removes it.
    ///
    /// # Errors
    ///
    /// Fails if the line isn't in the cart or the quantity exceeds stock.
    pub fn set_quantity(
        &mut self,
        product: &Product,
        size: Size,
        quantity: u32,
    ) -> Result<(), CartError> {
        let not_in_cart = || CartError::NotInCart {
            product_id: product.id.clone(),
            size,
        };

        if quantity == 0 {
            return if self.remove(&product.id, size) {
                Ok(())
            } else {
                Err(not_in_cart())
            };
        }

        let variant = sellable_variant(product, size)?;
        let item = self.line_mut(&product.id, size).ok_or_else(not_in_cart)?;
        if quantity > variant.stock {
            return Err(CartError::OutOfStock {
                size,
                available: variant.stock,
            });
        }

        item.quantity = quantity;
        item.unit_price = variant.price;
        Ok(())
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &ProductId, size: Size) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(product_id, size));
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all lines (the cart badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    fn line_mut(&mut self, product_id: &ProductId, size: Size) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.matches(product_id, size))
    }
}

fn sellable_variant(product: &Product, size: Size) -> Result<crate::product::Variant, CartError> {
    if product.status.is_deleted() {
        return Err(CartError::Unavailable(product.id.clone()));
    }
    product
        .variant(size)
        .copied()
        .ok_or_else(|| CartError::SizeNotOffered {
            product_id: product.id.clone(),
            size,
        })
}
