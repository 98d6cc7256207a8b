//! PostgreSQL persistence for the catalog and user sessions.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use tracing::{debug, info, warn};

use crate::cart::Cart;
use crate::catalog::{CatalogStore, Category, Product, ProductId};
use crate::errors::ShopError;
use crate::session::{DialogState, SessionStore, UserSession};

type ProductRow = (i64, String, String, String, i64, Option<String>, Option<String>);

const PRODUCT_COLUMNS: &str = "id, name, category, subcategory, price, description, image_path";

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            category VARCHAR(50) NOT NULL,
            subcategory VARCHAR(50) NOT NULL,
            price BIGINT NOT NULL,
            description TEXT,
            image_path VARCHAR(255)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create products table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS products_category_idx ON products (category)")
        .execute(pool)
        .await
        .context("Failed to create products category index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id BIGINT PRIMARY KEY,
            cart JSONB NOT NULL DEFAULT '[]',
            state TEXT NOT NULL DEFAULT 'MAIN_MENU'
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    // Tables created before session timestamps were tracked
    sqlx::query(
        "ALTER TABLE users ADD COLUMN IF NOT EXISTS updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()",
    )
    .execute(pool)
    .await
    .context("Failed to add users.updated_at column")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn product_from_row(row: ProductRow) -> Option<Product> {
    let (id, name, category, subcategory, price, description, image_path) = row;
    match category.parse::<Category>() {
        Ok(category) => Some(Product {
            id,
            name,
            category,
            subcategory,
            price,
            description: description.unwrap_or_default(),
            image_ref: image_path.unwrap_or_default(),
        }),
        Err(e) => {
            warn!(product_id = id, error = %e, "Skipping product with unknown category");
            None
        }
    }
}

/// Catalog and session store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(product_from_row))
    }

    async fn find_by_category(&self, category: Category) -> Result<Vec<Product>, ShopError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY id"
        ))
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().filter_map(product_from_row).collect())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn load(&self, user_id: i64) -> Result<Option<UserSession>, ShopError> {
        let row: Option<(Json<Cart>, String)> =
            sqlx::query_as("SELECT cart, state FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(cart), state)| {
            let dialog_state = state.parse::<DialogState>().unwrap_or_else(|e| {
                warn!(user_id = %user_id, error = %e, "Unknown stored dialog state, using MAIN_MENU");
                DialogState::MainMenu
            });
            UserSession {
                user_id,
                cart,
                dialog_state,
            }
        }))
    }

    async fn save(&self, session: &UserSession) -> Result<(), ShopError> {
        sqlx::query(
            "INSERT INTO users (id, cart, state, updated_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (id) DO UPDATE
             SET cart = EXCLUDED.cart, state = EXCLUDED.state, updated_at = NOW()",
        )
        .bind(session.user_id)
        .bind(Json(&session.cart))
        .bind(session.dialog_state.as_str())
        .execute(&self.pool)
        .await?;

        debug!(user_id = %session.user_id, state = %session.dialog_state, lines = session.cart.len(), "Session saved");
        Ok(())
    }
}

/// Inserts products missing from the catalog, matching existing rows by
/// (name, category, subcategory). Returns how many were inserted.
pub async fn seed_products(pool: &PgPool, products: &[Product]) -> Result<u64> {
    let mut inserted = 0;

    for product in products {
        let result = sqlx::query(
            "INSERT INTO products (name, category, subcategory, price, description, image_path)
             SELECT $1, $2, $3, $4, $5, $6
             WHERE NOT EXISTS (
                 SELECT 1 FROM products WHERE name = $1 AND category = $2 AND subcategory = $3
             )",
        )
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(&product.subcategory)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.image_ref)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert product {}", product.name))?;

        if result.rows_affected() == 0 {
            debug!(name = %product.name, "Product already present, skipping");
        }
        inserted += result.rows_affected();
    }

    info!(inserted, total = products.len(), "Catalog seeded");
    Ok(inserted)
}
