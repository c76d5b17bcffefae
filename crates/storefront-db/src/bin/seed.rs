//! # Seed Data Generator
//!
//! Populates the database with test products for development.
//!
//! ## Usage
//! ```bash
//! # Generate the default catalog
//! cargo run -p storefront-db --bin seed
//!
//! # Generate a custom amount
//! cargo run -p storefront-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//! ```
//!
//! Each product gets a SKU of the form `{CATEGORY}-{INDEX}`, a price
//! between $0.99 and $19.99, and stock between 0 and 100.

use chrono::Utc;
use std::env;
use tracing::{info, warn};

use storefront_core::Product;
use storefront_db::{Database, DbConfig};

/// Product categories for test SKUs.
const CATEGORIES: &[&str] = &["BEV", "SNK", "DRY", "FRZ", "GRO"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let count = arg_value(&args, "--count")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(100);
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./storefront.db".to_string());

    info!(count, db = %db_path, "Seeding products");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let products = db.products();
    let now = Utc::now();

    let mut inserted = 0usize;
    for i in 0..count {
        let category = CATEGORIES[i % CATEGORIES.len()];
        let product = Product {
            sku: format!("{}-{:04}", category, i),
            // deterministic pseudo-random spread, good enough for dev data
            stock: ((i * 37) % 101) as i64,
            price_cents: 99 + ((i * 53) % 1901) as i64,
            created_at: now,
            updated_at: now,
        };

        match products.insert(&product).await {
            Ok(()) => inserted += 1,
            Err(e) => warn!(sku = %product.sku, error = %e, "Skipping product"),
        }
    }

    info!(inserted, total = products.count().await?, "Seed complete");
    db.close().await;

    Ok(())
}

/// Returns the value following a `--flag` argument, if present.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
