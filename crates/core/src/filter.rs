//! Listing filters and pagination.
//!
//! Filters arrive from shoppers and admins as loose UI state (query string
//! parameters). They are normalized before use so that an empty search box
//! or a zero price bound is treated the same as "no filter". The GraphQL
//! variables built from them omit every absent field.

use serde::{Deserialize, Serialize};

use crate::graphql::queries::get_products;
use crate::product::Product;
use crate::types::{Genre, GenreError, Price, PriceError, ProductStatus, Size, SizeError};

/// Errors parsing listing query parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("{0}")]
    Size(#[from] SizeError),
    #[error("{0}")]
    Genre(#[from] GenreError),
    #[error("invalid {field}: {source}")]
    Price {
        field: &'static str,
        #[source]
        source: PriceError,
    },
    #[error("invalid status: {0:?}")]
    Status(String),
}

/// Listing query parameters exactly as they arrive in a query string.
///
/// Every field is a raw string so that empty form inputs (`?genre=`) are
/// treated as absent rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub genre: Option<String>,
    pub size: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListingQuery {
    /// Parse into a typed filter and page request.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if a non-empty value cannot be parsed.
    pub fn parse(self) -> Result<(ProductFilter, PageRequest), FilterError> {
        let price = |field: &'static str, value: Option<String>| {
            present(value)
                .map(|v| Price::parse(&v).map_err(|source| FilterError::Price { field, source }))
                .transpose()
        };

        let filter = ProductFilter {
            search: present(self.search),
            min_price: price("min_price", self.min_price)?,
            max_price: price("max_price", self.max_price)?,
            genre: present(self.genre).map(|g| Genre::parse(&g)).transpose()?,
            size: present(self.size).map(|s| Size::parse(&s)).transpose()?,
            status: present(self.status)
                .map(|s| ProductStatus::parse(&s).ok_or(FilterError::Status(s)))
                .transpose()?,
        };

        Ok((filter, PageRequest::new(self.page, self.limit)))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// User-selected listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

impl ProductFilter {
    /// Collapse empty values to `None` and order the price bounds.
    #[must_use]
    pub fn normalized(self) -> Self {
        let search = self
            .search
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        let min_price = self.min_price.filter(|p| !p.amount().is_zero());
        let max_price = self.max_price.filter(|p| !p.amount().is_zero());
        let (min_price, max_price) = match (min_price, max_price) {
            (Some(min), Some(max)) if min > max => (Some(max), Some(min)),
            bounds => bounds,
        };

        Self {
            search,
            min_price,
            max_price,
            genre: self.genre,
            size: self.size,
            status: self.status,
        }
    }

    /// Whether no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build the backend query variables for one page of results.
    ///
    /// The filter is normalized first. Absent filters are left out of the
    /// payload entirely rather than sent as empty strings or zeros.
    #[must_use]
    pub fn to_variables(&self, page: PageRequest) -> get_products::Variables {
        let filter = self.clone().normalized();
        let input = get_products::ProductFilterInput {
            search: filter.search,
            min_price: filter.min_price.map(Price::amount),
            max_price: filter.max_price.map(Price::amount),
            genre: filter.genre.map(|g| g.backend_name().to_owned()),
            talla: filter.size.map(Size::backend_form),
            status: filter.status.map(|s| s.backend_name().to_owned()),
        };

        get_products::Variables {
            filter: (!input.is_empty()).then_some(input),
            page: i64::from(page.page),
            limit: i64::from(page.limit),
        }
    }
}

/// Requested page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 12;
    pub const MAX_LIMIT: u32 = 100;

    /// Build a page request, clamping page to >= 1 and limit to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    #[must_use]
    pub const fn first(limit: u32) -> Self {
        Self { page: 1, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// The filter most recently used by a listing, remembered between requests.
///
/// Changing any filter sends the listing back to page 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingState {
    pub filter: ProductFilter,
    pub page: u32,
}

impl ListingState {
    /// Record a new request and return the page that should be fetched.
    ///
    /// If the normalized filter differs from the remembered one, the
    /// requested page is ignored and the listing restarts at page 1.
    pub fn apply(&mut self, filter: ProductFilter, requested: PageRequest) -> PageRequest {
        let filter = filter.normalized();
        let page = if filter == self.filter {
            requested.page
        } else {
            1
        };

        self.filter = filter;
        self.page = page;

        PageRequest {
            page,
            limit: requested.limit,
        }
    }
}

/// One page of products plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl ProductPage {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::parse(s).unwrap()
    }

    #[test]
    fn test_empty_filter_sends_no_filter_object() {
        let vars = ProductFilter::default().to_variables(PageRequest::default());
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json, serde_json::json!({ "page": 1, "limit": 12 }));
    }

    #[test]
    fn test_blank_and_zero_values_are_omitted() {
        let filter = ProductFilter {
            search: Some("   ".to_string()),
            min_price: Some(Price::ZERO),
            max_price: Some(price("30")),
            genre: Some(Genre::Boy),
            ..ProductFilter::default()
        };
        let json = serde_json::to_value(filter.to_variables(PageRequest::default())).unwrap();
        assert_eq!(
            json["filter"],
            serde_json::json!({ "maxPrice": 30.0, "genre": "BOY" })
        );
    }

    #[test]
    fn test_size_is_sent_in_backend_form() {
        let filter = ProductFilter {
            size: Some(Size::M18),
            ..ProductFilter::default()
        };
        let json = serde_json::to_value(filter.to_variables(PageRequest::default())).unwrap();
        assert_eq!(json["filter"]["talla"], "M18");
    }

    #[test]
    fn test_price_bounds_swapped_when_reversed() {
        let filter = ProductFilter {
            min_price: Some(price("50")),
            max_price: Some(price("10")),
            ..ProductFilter::default()
        }
        .normalized();
        assert_eq!(filter.min_price, Some(price("10")));
        assert_eq!(filter.max_price, Some(price("50")));
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, PageRequest::MAX_LIMIT);
    }

    #[test]
    fn test_listing_state_resets_page_when_filter_changes() {
        let mut state = ListingState::default();

        let first = state.apply(ProductFilter::default(), PageRequest::new(Some(3), None));
        assert_eq!(first.page, 3);

        let changed = ProductFilter {
            genre: Some(Genre::Girl),
            ..ProductFilter::default()
        };
        let reset = state.apply(changed.clone(), PageRequest::new(Some(3), None));
        assert_eq!(reset.page, 1);

        let next = state.apply(changed, PageRequest::new(Some(2), None));
        assert_eq!(next.page, 2);
    }

    #[test]
    fn test_listing_state_ignores_cosmetic_changes() {
        let mut state = ListingState::default();
        state.apply(
            ProductFilter {
                search: Some("body".to_string()),
                ..ProductFilter::default()
            },
            PageRequest::default(),
        );
        let same = state.apply(
            ProductFilter {
                search: Some("  body ".to_string()),
                ..ProductFilter::default()
            },
            PageRequest::new(Some(4), None),
        );
        assert_eq!(same.page, 4);
    }

    #[test]
    fn test_listing_query_treats_blank_as_absent() {
        let query = ListingQuery {
            genre: Some(String::new()),
            size: Some("3m".to_string()),
            min_price: Some(" ".to_string()),
            page: Some(2),
            ..ListingQuery::default()
        };
        let (filter, page) = query.parse().unwrap();
        assert_eq!(filter.genre, None);
        assert_eq!(filter.size, Some(Size::M3));
        assert_eq!(filter.min_price, None);
        assert_eq!(page.page, 2);
    }

    #[test]
    fn test_listing_query_rejects_bad_values() {
        let bad_size = ListingQuery {
            size: Some("7M".to_string()),
            ..ListingQuery::default()
        };
        assert!(matches!(bad_size.parse(), Err(FilterError::Size(_))));

        let bad_price = ListingQuery {
            max_price: Some("-4".to_string()),
            ..ListingQuery::default()
        };
        assert!(matches!(
            bad_price.parse(),
            Err(FilterError::Price { field: "max_price", .. })
        ));
    }

    #[test]
    fn test_product_page_math() {
        let page = ProductPage {
            products: vec![],
            total: 25,
            page: 2,
            limit: 12,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
    }
}
