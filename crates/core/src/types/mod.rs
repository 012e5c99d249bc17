//! Core types for Minimoda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod genre;
pub mod id;
pub mod price;
pub mod size;
pub mod status;

pub use genre::{Genre, GenreError};
pub use id::*;
pub use price::{Price, PriceError};
pub use size::{Size, SizeError, to_backend_form, to_client_form};
pub use status::ProductStatus;
