// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use order_core::{MemoryStore, OrderManager, Product, StockPolicy};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;

// --- Catalog used across tests ---
pub const MUG: i32 = 1; // 8.00, 10 on hand
pub const TEE: i32 = 2; // 19.99, 2 on hand
pub const POSTER: i32 = 3; // 5.50, 1 on hand
pub const SOLD_OUT: i32 = 4; // 12.00, none on hand
pub const MISSING: i32 = 99;

pub fn price(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

pub fn catalog() -> Vec<Product> {
  vec![
    Product::new(MUG, "Mug", price(800), 10),
    Product::new(TEE, "T-shirt", price(1999), 2),
    Product::new(POSTER, "Poster", price(550), 1),
    Product::new(SOLD_OUT, "Sticker pack", price(1200), 0),
  ]
}

pub fn seeded_store() -> MemoryStore {
  MemoryStore::with_products(catalog())
}

pub fn manager_for(store: &MemoryStore, policy: StockPolicy) -> OrderManager {
  OrderManager::new(Arc::new(store.clone()), policy)
}

/// Product ids as a multiset, so tests never depend on element order.
pub fn multiset(product_ids: &[i32]) -> HashMap<i32, usize> {
  let mut counts = HashMap::new();
  for id in product_ids {
    *counts.entry(*id).or_insert(0) += 1;
  }
  counts
}

pub async fn stock_of(store: &MemoryStore, product_id: i32) -> i32 {
  store.product(product_id).await.map(|p| p.quantity).unwrap_or(-1)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
