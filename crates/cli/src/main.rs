//! Minimoda CLI - Operator tools for the catalog and media host.
//!
//! # Usage
//!
//! ```bash
//! # Convert a size between encodings
//! minimoda size normalize 3M --to backend
//!
//! # Print the size chart
//! minimoda size list
//!
//! # Inspect and maintain products (needs MINIMODA_ADMIN_TOKEN)
//! minimoda products list --status deleted
//! minimoda products delete <id>
//! minimoda products restore <id>
//!
//! # Media host
//! minimoda upload sign
//! minimoda upload image ./enterito.jpg
//! ```
//!
//! # Commands
//!
//! - `size` - Size chart conversions
//! - `products` - List, soft delete and restore products
//! - `upload` - Signed upload parameters and direct image uploads

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod commands;

use commands::size::SizeForm;

#[derive(Parser)]
#[command(name = "minimoda")]
#[command(author, version, about = "Minimoda operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Size chart conversions
    Size {
        #[command(subcommand)]
        action: SizeAction,
    },
    /// Inspect and maintain products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Media host uploads
    Upload {
        #[command(subcommand)]
        action: UploadAction,
    },
}

#[derive(Subcommand)]
enum SizeAction {
    /// Convert a size to client (`3M`) or backend (`M3`) form
    Normalize {
        /// Size in either form
        value: String,

        /// Target encoding
        #[arg(long, value_enum, default_value = "client")]
        to: SizeForm,
    },
    /// Print the size chart in both forms
    List,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List one page of products
    List {
        /// Only this status (`available`, `sold_out`, `deleted`)
        #[arg(short, long)]
        status: Option<String>,

        /// Page number (1-based)
        #[arg(short, long)]
        page: Option<u32>,

        /// Products per page
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Soft delete a product
    Delete {
        /// Product ID
        id: String,
    },
    /// Restore a soft-deleted product
    Restore {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum UploadAction {
    /// Print signed parameters for a direct upload
    Sign,
    /// Upload a local image file
    Image {
        /// Path to a jpg, png, webp, gif or avif file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output can be piped
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Size { action } => match action {
            SizeAction::Normalize { value, to } => {
                emit_line(&commands::size::normalize(&value, to)?);
            }
            SizeAction::List => emit(&commands::size::list())?,
        },
        Commands::Products { action } => match action {
            ProductAction::List {
                status,
                page,
                limit,
            } => emit(&commands::products::list(status, page, limit).await?)?,
            ProductAction::Delete { id } => emit(&commands::products::delete(&id).await?)?,
            ProductAction::Restore { id } => emit(&commands::products::restore(&id).await?)?,
        },
        Commands::Upload { action } => match action {
            UploadAction::Sign => emit(&commands::upload::sign()?)?,
            UploadAction::Image { path } => emit(&commands::upload::image(&path).await?)?,
        },
    }
    Ok(())
}

/// Print a result as pretty JSON on stdout.
fn emit(value: &impl Serialize) -> Result<(), serde_json::Error> {
    emit_line(&serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn emit_line(line: &str) {
    println!("{line}");
}
