//! Size chart commands.
//!
//! # Usage
//!
//! ```bash
//! minimoda size normalize 3M --to backend   # M3
//! minimoda size normalize T12 --to client   # 12T
//! minimoda size list
//! ```

use clap::ValueEnum;
use minimoda_core::{Size, SizeError, to_backend_form, to_client_form};
use serde::Serialize;

/// Which encoding to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SizeForm {
    /// Number first, as shoppers see it (`3M`, `12T`)
    Client,
    /// Letter first, as the catalog stores it (`M3`, `T12`)
    Backend,
}

/// One row of the size chart in both encodings.
#[derive(Debug, Serialize)]
pub struct SizeRow {
    pub client: String,
    pub backend: String,
}

/// Convert a size to the requested encoding.
///
/// # Errors
///
/// Returns [`SizeError`] if the input is not a size on the chart.
pub fn normalize(value: &str, to: SizeForm) -> Result<String, SizeError> {
    match to {
        SizeForm::Client => to_client_form(value),
        SizeForm::Backend => to_backend_form(value),
    }
}

/// The whole chart in display order.
#[must_use]
pub fn list() -> Vec<SizeRow> {
    Size::ALL
        .iter()
        .map(|size| SizeRow {
            client: size.client_form(),
            backend: size.backend_form(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_both_ways() {
        assert_eq!(normalize("3M", SizeForm::Backend).unwrap(), "M3");
        assert_eq!(normalize("m3", SizeForm::Client).unwrap(), "3M");
        assert_eq!(normalize("RN", SizeForm::Backend).unwrap(), "RN");
        assert!(normalize("7M", SizeForm::Client).is_err());
    }

    #[test]
    fn test_list_starts_with_newborn() {
        let rows = list();
        assert_eq!(rows.len(), Size::ALL.len());
        assert_eq!(rows.first().unwrap().client, "RN");
        assert_eq!(rows.last().unwrap().backend, "T16");
    }
}
