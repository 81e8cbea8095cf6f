//! Batchwise CLI - Database migrations and inventory operations.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! batchwise migrate
//!
//! # Create products (and starting batches) from a YAML file
//! batchwise seed products.yaml
//!
//! # Receive a batch
//! batchwise restock --product 1 --quantity 40 --expiry 2026-03-01
//!
//! # Consume stock, soonest expiry first
//! batchwise consume --product 1 --quantity 8 --note "sale #1042"
//!
//! # Reconcile one product, or all of them
//! batchwise reconcile --product 1
//! batchwise reconcile
//!
//! # Batches expiring within 14 days
//! batchwise expiring --days 14
//!
//! # Ledger for a product
//! batchwise history 1
//!
//! # Purge ledger entries older than 180 days
//! batchwise purge --days 180
//! ```
//!
//! All commands read `BATCHWISE_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use batchwise_core::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "batchwise")]
#[command(author, version, about = "Batchwise inventory tools")]
struct Cli {
    /// Actor recorded in the adjustment ledger
    #[arg(long, global = true, default_value = "cli")]
    actor: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create products from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,
    },
    /// Receive a new batch
    Restock {
        #[arg(short, long)]
        product: ProductId,

        #[arg(short, long)]
        quantity: i32,

        /// Expiry date (YYYY-MM-DD), must be after today
        #[arg(short, long)]
        expiry: NaiveDate,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Consume stock, soonest expiry first
    Consume {
        #[arg(short, long)]
        product: ProductId,

        #[arg(short, long)]
        quantity: i32,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Recompute stock from live batches
    Reconcile {
        /// Only this product (default: all products)
        #[arg(short, long)]
        product: Option<ProductId>,
    },
    /// List batches expiring soon
    Expiring {
        #[arg(short, long, default_value_t = 30)]
        days: i64,
    },
    /// Show a product's adjustment ledger
    History {
        product: ProductId,
    },
    /// Purge old adjustment ledger entries
    Purge {
        /// Age in days (default: configured retention)
        #[arg(short, long)]
        days: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let actor = cli.actor.as_str();
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::products(&file, actor).await?,
        Commands::Restock {
            product,
            quantity,
            expiry,
            note,
        } => commands::inventory::restock(product, quantity, expiry, note, actor).await?,
        Commands::Consume {
            product,
            quantity,
            note,
        } => commands::inventory::consume(product, quantity, note.as_deref(), actor).await?,
        Commands::Reconcile { product } => commands::inventory::reconcile(product).await?,
        Commands::Expiring { days } => commands::inventory::expiring(days).await?,
        Commands::History { product } => commands::inventory::history(product).await?,
        Commands::Purge { days } => commands::inventory::purge(days).await?,
    }
    Ok(())
}
