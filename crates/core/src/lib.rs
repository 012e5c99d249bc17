//! Minimoda Core - Shared domain library.
//!
//! This crate provides the domain types and pure logic used by every
//! Minimoda component:
//! - `storefront` - Public JSON API for shoppers (listing, detail, cart, favorites)
//! - `admin` - Internal product management API (CRUD, soft delete, image upload)
//! - `cli` - Operator tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything that talks to the GraphQL backend or the media host
//! lives in the binary crates and converts into these types.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for IDs, sizes, genres, prices and statuses
//! - [`product`] - Products, variants and submission validation
//! - [`filter`] - Listing filters, pagination and the GraphQL query payload
//! - [`cart`] / [`favorites`] - Session-persisted shopper state
//! - [`optimistic`] - Optimistic list mutation with rollback
//! - [`graphql`] - Wire types and query definitions for the catalog backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod favorites;
pub mod filter;
pub mod graphql;
pub mod optimistic;
pub mod product;
pub mod types;

pub use cart::{Cart, CartError, CartItem};
pub use favorites::{FavoriteItem, Favorites};
pub use filter::{FilterError, ListingQuery, ListingState, PageRequest, ProductFilter, ProductPage};
pub use optimistic::{Keyed, OptimisticError, OptimisticList, PendingAction};
pub use product::{ImageRef, Product, ProductDraft, ProductError, ValidDraft, Variant};
pub use types::*;
