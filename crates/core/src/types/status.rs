//! Product lifecycle status.
//!
//! `Available` and `SoldOut` are derived from stock; `Deleted` is the
//! soft-delete flag set from the admin surface. Records are never removed.

use serde::{Deserialize, Serialize};

/// Product status as seen by shoppers and admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    SoldOut,
    Deleted,
}

impl ProductStatus {
    /// Status implied by a total stock count.
    #[must_use]
    pub const fn from_total_stock(total_stock: u64) -> Self {
        if total_stock > 0 {
            Self::Available
        } else {
            Self::SoldOut
        }
    }

    /// Enum value used by the catalog backend.
    #[must_use]
    pub const fn backend_name(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::SoldOut => "SOLD_OUT",
            Self::Deleted => "DELETED",
        }
    }

    /// Parse a status in backend or API spelling.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "available" => Some(Self::Available),
            "sold_out" | "soldout" => Some(Self::SoldOut),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::SoldOut => write!(f, "sold_out"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_total_stock() {
        assert_eq!(ProductStatus::from_total_stock(0), ProductStatus::SoldOut);
        assert_eq!(ProductStatus::from_total_stock(1), ProductStatus::Available);
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!(ProductStatus::parse("SOLD_OUT"), Some(ProductStatus::SoldOut));
        assert_eq!(ProductStatus::parse("sold-out"), Some(ProductStatus::SoldOut));
        assert_eq!(ProductStatus::parse("DELETED"), Some(ProductStatus::Deleted));
        assert_eq!(ProductStatus::parse("archived"), None);
    }
}
