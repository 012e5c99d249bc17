//! CLI subcommand implementations.

pub mod products;
pub mod size;
pub mod upload;
