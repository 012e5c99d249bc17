//! Stateful services behind the admin routes.

pub mod product_list;

pub use product_list::{ProductListView, ViewSnapshot};
