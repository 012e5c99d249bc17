//! Session-related types.
//!
//! The cart, favorites and listing state are stored in the session and
//! written back after every mutation.

use serde::{Serialize, de::DeserializeOwned};
use tower_sessions::Session;

/// Session keys for shopper state.
pub mod keys {
    /// Key for the shopper's cart.
    pub const CART: &str = "cart";

    /// Key for the shopper's favorites.
    pub const FAVORITES: &str = "favorites";

    /// Key for the last listing filter and page.
    pub const LISTING: &str = "listing";
}

/// Read a value from the session, falling back to its default.
///
/// A value that no longer deserializes (for example after a format change)
/// is logged and treated as absent.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load<T>(session: &Session, key: &str) -> Result<T, tower_sessions::session::Error>
where
    T: Default + DeserializeOwned,
{
    match session.get::<T>(key).await {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(tower_sessions::session::Error::SerdeJson(e)) => {
            tracing::warn!(key, error = %e, "Discarding unreadable session value");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

/// Write a value back to the session.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or the store fails.
pub async fn store<T>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error>
where
    T: Serialize + Sync,
{
    session.insert(key, value).await
}
