//! Shopify Lite CLI - Catalog and order management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create products from a JSON array
//! sl-cli seed products.json
//!
//! # List every product, including sold-out ones
//! sl-cli products list
//!
//! # List orders, newest first
//! sl-cli orders list
//!
//! # Mark an order as shipped
//! sl-cli orders ship 3f9a2c1e
//! ```
//!
//! The store is selected with the same environment variables as the
//! storefront and admin binaries.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shopify_lite_core::OrderId;
use shopify_lite_store::{Repositories, StoreConfig};

mod commands;

#[derive(Parser)]
#[command(name = "sl-cli")]
#[command(author, version, about = "Shopify Lite CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create products from a JSON file
    Seed {
        /// Path to a JSON array of products
        file: PathBuf,
    },
    /// Inspect the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect and fulfil orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List every product
    List,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders, newest first
    List,
    /// Mark a new order as shipped
    Ship {
        /// Order document id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let store = shopify_lite_store::connect(&config).await?;
    let repos = Repositories::new(store, &config.app_id);

    match cli.command {
        Commands::Seed { file } => {
            let created = commands::seed::seed_file(&repos, &file).await?;
            tracing::info!("Seeded {} products", created.len());
        }
        Commands::Products { action } => match action {
            ProductAction::List => {
                let products = commands::products::list(&repos).await?;
                tracing::info!("{} products", products.len());
                for product in &products {
                    tracing::info!("  {}", commands::products::describe(product));
                }
            }
        },
        Commands::Orders { action } => match action {
            OrderAction::List => {
                let orders = commands::orders::list(&repos).await?;
                tracing::info!(
                    "{} orders ({} new)",
                    orders.len(),
                    shopify_lite_core::order::count_new(&orders)
                );
                for order in &orders {
                    tracing::info!("  {}", commands::orders::describe(order));
                }
            }
            OrderAction::Ship { id } => {
                let order = commands::orders::ship(&repos, &OrderId::new(id)).await?;
                tracing::info!("Order {} is now {}", order.id, order.status.as_str());
            }
        },
    }
    Ok(())
}
