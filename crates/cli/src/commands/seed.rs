//! Seed products from a YAML file.
//!
//! ```yaml
//! products:
//!   - title: Arroz Premium Blanco
//!     unit_price: "2.50"
//!     unit: kg
//!     category: Grains
//!     starting_stock: 40
//!     starting_expiry: 2026-12-01
//!     batches:
//!       - quantity: 20
//!         expiry_date: 2027-03-01
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

use batchwise_server::models::{CreateProductInput, RestockInput};

/// Contents of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub products: Vec<SeedProduct>,
}

/// One product to create, with any extra batches to receive after it.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    #[serde(flatten)]
    pub product: CreateProductInput,
    #[serde(default)]
    pub batches: Vec<RestockInput>,
}

/// Parse a seed file, rejecting products without a title.
fn parse(content: &str) -> Result<SeedFile, Box<dyn std::error::Error>> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    let untitled = file
        .products
        .iter()
        .filter(|p| p.product.title.trim().is_empty())
        .count();
    if untitled > 0 {
        return Err(format!("{untitled} products have an empty title").into());
    }
    Ok(file)
}

/// Create every product in `file_path`.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, or the database is
/// unreachable. Individual product failures are logged and counted.
pub async fn products(file_path: &str, actor: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Parse before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed = parse(&content)?;
    info!(products = seed.products.len(), "Parsed seed file");

    let engine = super::engine().await?;

    let mut created = 0;
    let mut batches = 0;
    let mut failed = 0;
    for entry in seed.products {
        let title = entry.product.title.clone();
        let product = match engine.create_product(entry.product, actor).await {
            Ok(result) => {
                created += 1;
                if result.starting_batch.is_some() {
                    batches += 1;
                }
                result.product
            }
            Err(e) => {
                error!(%title, "Failed to create product: {e}");
                failed += 1;
                continue;
            }
        };

        for batch in entry.batches {
            match engine.restock(product.id, batch, actor).await {
                Ok(_) => batches += 1,
                Err(e) => {
                    warn!(product_id = %product.id, "Failed to receive batch: {e}");
                    failed += 1;
                }
            }
        }
    }

    info!("Seeding complete!");
    info!("  Products created: {created}");
    info!("  Batches received: {batches}");
    if failed > 0 {
        error!("  Failures: {failed}");
    }

    Ok(())
}
