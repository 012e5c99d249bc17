//! Garment sizes (tallas) and their two textual encodings.
//!
//! Shoppers see sizes in *client form*: the number first, then the unit
//! letter (`3M` for three months, `2T` for age two). The catalog backend
//! stores the same sizes in *backend form*, unit letter first (`M3`, `T2`).
//! The newborn sentinel is `RN` in both.
//!
//! Both directions of canonicalization are idempotent, and anything outside
//! the fixed enumeration is rejected instead of passed through.
//!
//! ```
//! use minimoda_core::{to_backend_form, to_client_form};
//!
//! assert_eq!(to_backend_form("3M").unwrap(), "M3");
//! assert_eq!(to_backend_form("M3").unwrap(), "M3");
//! assert_eq!(to_client_form("T12").unwrap(), "12T");
//! assert!(to_client_form("7M").is_err());
//! ```

use core::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Client form: number, optional whitespace, unit (`3M`, `12 m`).
static CLIENT_FORM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2})\s*([MT])$").expect("Invalid regex"));

/// Backend form: unit, optional whitespace, number (`M3`, `t 2`).
static BACKEND_FORM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([MT])\s*(\d{1,2})$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// The input is empty or whitespace.
    #[error("size cannot be empty")]
    Empty,
    /// The input is not shaped like a size in either encoding.
    #[error("malformed size: {0:?}")]
    Malformed(String),
    /// The input is well formed but not one of the sizes we sell.
    #[error("unknown size: {0:?}")]
    Unknown(String),
}

/// Unit of a sized band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Unit {
    Months,
    Years,
}

impl Unit {
    const fn letter(self) -> char {
        match self {
            Self::Months => 'M',
            Self::Years => 'T',
        }
    }

    fn from_letter(s: &str) -> Option<Self> {
        match s {
            "M" | "m" => Some(Self::Months),
            "T" | "t" => Some(Self::Years),
            _ => None,
        }
    }
}

/// A size from the store's fixed size chart.
///
/// Ordering follows the chart: newborn, month bands, then age bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Size {
    Newborn,
    M3,
    M6,
    M9,
    M12,
    M18,
    M24,
    T2,
    T3,
    T4,
    T5,
    T6,
    T8,
    T10,
    T12,
    T14,
    T16,
}

impl Size {
    /// Every size, in chart order.
    pub const ALL: [Self; 17] = [
        Self::Newborn,
        Self::M3,
        Self::M6,
        Self::M9,
        Self::M12,
        Self::M18,
        Self::M24,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::T6,
        Self::T8,
        Self::T10,
        Self::T12,
        Self::T14,
        Self::T16,
    ];

    /// Literal used for newborns in both encodings.
    pub const NEWBORN_LABEL: &'static str = "RN";

    const fn band(self) -> Option<(Unit, u8)> {
        match self {
            Self::Newborn => None,
            Self::M3 => Some((Unit::Months, 3)),
            Self::M6 => Some((Unit::Months, 6)),
            Self::M9 => Some((Unit::Months, 9)),
            Self::M12 => Some((Unit::Months, 12)),
            Self::M18 => Some((Unit::Months, 18)),
            Self::M24 => Some((Unit::Months, 24)),
            Self::T2 => Some((Unit::Years, 2)),
            Self::T3 => Some((Unit::Years, 3)),
            Self::T4 => Some((Unit::Years, 4)),
            Self::T5 => Some((Unit::Years, 5)),
            Self::T6 => Some((Unit::Years, 6)),
            Self::T8 => Some((Unit::Years, 8)),
            Self::T10 => Some((Unit::Years, 10)),
            Self::T12 => Some((Unit::Years, 12)),
            Self::T14 => Some((Unit::Years, 14)),
            Self::T16 => Some((Unit::Years, 16)),
        }
    }

    fn from_band(unit: Unit, number: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.band() == Some((unit, number)))
    }

    /// Parse a size written in either encoding.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::Malformed`] if the input matches neither
    /// encoding, and [`SizeError::Unknown`] if it is well formed but not in
    /// the size chart.
    pub fn parse(input: &str) -> Result<Self, SizeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SizeError::Empty);
        }

        if trimmed.eq_ignore_ascii_case(Self::NEWBORN_LABEL) || trimmed.eq_ignore_ascii_case("NB")
        {
            return Ok(Self::Newborn);
        }

        let (number, unit) = if let Some(caps) = CLIENT_FORM_RE.captures(trimmed) {
            (caps.get(1), caps.get(2))
        } else if let Some(caps) = BACKEND_FORM_RE.captures(trimmed) {
            (caps.get(2), caps.get(1))
        } else {
            return Err(SizeError::Malformed(trimmed.to_owned()));
        };

        let number = number
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .ok_or_else(|| SizeError::Malformed(trimmed.to_owned()))?;
        let unit = unit
            .and_then(|m| Unit::from_letter(m.as_str()))
            .ok_or_else(|| SizeError::Malformed(trimmed.to_owned()))?;

        Self::from_band(unit, number).ok_or_else(|| SizeError::Unknown(trimmed.to_owned()))
    }

    /// The shopper-facing label (`3M`, `2T`, `RN`).
    #[must_use]
    pub fn client_form(self) -> String {
        self.band().map_or_else(
            || Self::NEWBORN_LABEL.to_owned(),
            |(unit, number)| format!("{number}{}", unit.letter()),
        )
    }

    /// The label stored by the catalog backend (`M3`, `T2`, `RN`).
    #[must_use]
    pub fn backend_form(self) -> String {
        self.band().map_or_else(
            || Self::NEWBORN_LABEL.to_owned(),
            |(unit, number)| format!("{}{number}", unit.letter()),
        )
    }
}

/// Canonicalize a size to client form.
///
/// # Errors
///
/// Returns an error if the input is not a size from the chart.
pub fn to_client_form(input: &str) -> Result<String, SizeError> {
    Size::parse(input).map(Size::client_form)
}

/// Canonicalize a size to backend form.
///
/// # Errors
///
/// Returns an error if the input is not a size from the chart.
pub fn to_backend_form(input: &str) -> Result<String, SizeError> {
    Size::parse(input).map(Size::backend_form)
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.client_form())
    }
}

impl FromStr for Size {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Size {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.client_form())
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
