// order-service/src/db.rs

//! Store construction and optional demo data.

use order_core::{MemoryStore, OrderStore, PgOrderStore, Product};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::{AppConfig, StoreBackend};
use crate::errors::{AppError, Result};

pub fn demo_products() -> Vec<Product> {
  vec![
    Product::new(1, "Wireless mouse", Decimal::new(2499, 2), 25),
    Product::new(2, "Mechanical keyboard", Decimal::new(8900, 2), 10),
    Product::new(3, "USB-C cable", Decimal::new(999, 2), 100),
    Product::new(4, "27\" monitor", Decimal::new(27900, 2), 3),
  ]
}

#[instrument(name = "db::build_store", skip(config), fields(backend = ?config.store_backend))]
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn OrderStore>> {
  match config.store_backend {
    StoreBackend::Memory => {
      let products = if config.seed_db { demo_products() } else { Vec::new() };
      info!(products = products.len(), "Using in-memory order store.");
      Ok(Arc::new(MemoryStore::with_products(products)))
    }
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
      info!("Successfully connected to the database.");

      if config.seed_db {
        seed_db(&pool).await?;
      }
      Ok(Arc::new(PgOrderStore::new(pool)))
    }
  }
}

/// Inserts the demo catalog, leaving existing product rows untouched.
pub async fn seed_db(pool: &PgPool) -> Result<()> {
  let mut tx = pool.begin().await?;
  for product in demo_products() {
    sqlx::query(
      "INSERT INTO products (id, name, price, quantity) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(product.price)
    .bind(product.quantity)
    .execute(&mut *tx)
    .await?;
  }
  // Explicit ids bypass the sequence; move it past them.
  sqlx::query("SELECT setval(pg_get_serial_sequence('products', 'id'), GREATEST((SELECT MAX(id) FROM products), 1))")
    .execute(&mut *tx)
    .await?;
  tx.commit().await?;
  info!("Database seeded with demo products.");
  Ok(())
}
