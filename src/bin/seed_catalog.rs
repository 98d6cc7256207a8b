//! Seeds the product catalog with the default pet food range.
//!
//! Usage: `DATABASE_URL=postgres://... cargo run --bin seed_catalog`

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use petshop_bot::catalog::default_products;
use petshop_bot::config::DATABASE_VAR;
use petshop_bot::db::{init_database_schema, seed_products};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let database_url =
        std::env::var(DATABASE_VAR).with_context(|| format!("{DATABASE_VAR} must be set"))?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    init_database_schema(&pool).await?;

    let products = default_products();
    let inserted = seed_products(&pool, &products).await?;
    info!(inserted, skipped = products.len() as u64 - inserted, "Seeding finished");

    Ok(())
}
