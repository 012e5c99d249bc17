//! Session-held admin models.

pub mod session;

pub use session::{AdminToken, StoredAuth, keys as session_keys};
