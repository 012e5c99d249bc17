//! Cache types for catalog responses.

use minimoda_core::{PageRequest, Product, ProductPage};

/// Cache key for products and listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    /// Unfiltered public listing page.
    Listing { page: u32, limit: u32 },
}

impl CacheKey {
    pub const fn listing(page: PageRequest) -> Self {
        Self::Listing {
            page: page.page,
            limit: page.limit,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Listing(ProductPage),
}
