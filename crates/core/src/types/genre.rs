//! Product genre (who the garment is cut for).

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a genre string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid genre: {0:?} (expected girl, boy or unisex)")]
pub struct GenreError(pub String);

/// Target genre of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Girl,
    Boy,
    Unisex,
}

impl Genre {
    /// Enum value used by the catalog backend.
    #[must_use]
    pub const fn backend_name(self) -> &'static str {
        match self {
            Self::Girl => "GIRL",
            Self::Boy => "BOY",
            Self::Unisex => "UNISEX",
        }
    }

    /// Parse a genre written either in API or backend spelling.
    ///
    /// # Errors
    ///
    /// Returns [`GenreError`] for anything other than girl/boy/unisex.
    pub fn parse(input: &str) -> Result<Self, GenreError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "girl" => Ok(Self::Girl),
            "boy" => Ok(Self::Boy),
            "unisex" => Ok(Self::Unisex),
            _ => Err(GenreError(input.to_owned())),
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Girl => write!(f, "girl"),
            Self::Boy => write!(f, "boy"),
            Self::Unisex => write!(f, "unisex"),
        }
    }
}

impl FromStr for Genre {
    type Err = GenreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
