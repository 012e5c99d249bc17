//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with in-memory store)
//!
//! Auth is an extractor, not a layer: every `/api` handler takes
//! [`RequireAdminAuth`].

pub mod auth;
pub mod session;

pub use auth::{RequireAdminAuth, clear_stored_auth, get_stored_auth, set_stored_auth};
pub use session::create_session_layer;
