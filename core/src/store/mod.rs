// order_core/src/store/mod.rs

//! Storage capability consumed by the order manager.
//!
//! An `OrderStore` hands out `OrderTransaction`s. Everything done through one
//! transaction becomes visible together on `commit`, or not at all: `rollback`
//! and dropping an uncommitted transaction both discard every write.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::OrderResult;
use crate::inventory::InventoryLedger;
use crate::models::{OrderFilter, OrderLineRow};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgOrderStore;

/// Which headers a read returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
  All,
  ById(i32),
  ByUser(i32),
  ByStatus(String),
}

impl From<OrderFilter> for OrderScope {
  fn from(filter: OrderFilter) -> Self {
    match filter {
      OrderFilter::User(user_id) => OrderScope::ByUser(user_id),
      OrderFilter::Status(status) => OrderScope::ByStatus(status),
    }
  }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Opens a new atomic unit.
  async fn begin(&self) -> OrderResult<Box<dyn OrderTransaction>>;

  /// Header-to-line-item join for the headers in `scope`, one row per line
  /// item (or one row with no product for a header without items), in
  /// storage insertion order.
  async fn order_rows(&self, scope: OrderScope) -> OrderResult<Vec<OrderLineRow>>;
}

/// Writes and stock reads that share one atomic unit.
#[async_trait]
pub trait OrderTransaction: InventoryLedger {
  /// Locks the header against concurrent writers and returns the product ids of
  /// its current line items, or `None` if no such order exists.
  async fn lock_order(&mut self, order_id: i32) -> OrderResult<Option<Vec<i32>>>;

  /// Locks every listed product row for the rest of the transaction, in
  /// ascending id order. Must run before any stock read or adjustment, so a
  /// transaction never takes product locks in more than one pass.
  async fn lock_products(&mut self, product_ids: &[i32]) -> OrderResult<()>;

  /// Inserts a header; storage assigns the id and order date.
  async fn insert_order(&mut self, user_id: i32, status: &str, total_price: Decimal) -> OrderResult<i32>;

  /// Rewrites user, status and price. Returns false when no header matched.
  async fn update_order(
    &mut self,
    order_id: i32,
    user_id: i32,
    status: &str,
    total_price: Decimal,
  ) -> OrderResult<bool>;

  /// Returns false when no header matched.
  async fn delete_order(&mut self, order_id: i32) -> OrderResult<bool>;

  /// One row per element of `product_ids`, duplicates included.
  async fn insert_line_items(&mut self, order_id: i32, product_ids: &[i32]) -> OrderResult<()>;

  /// Returns the number of rows removed.
  async fn delete_line_items(&mut self, order_id: i32) -> OrderResult<u64>;

  /// Adds `delta` (negative to take units out) to a product's quantity.
  async fn adjust_stock(&mut self, product_id: i32, delta: i32) -> OrderResult<()>;

  async fn commit(&mut self) -> OrderResult<()>;

  async fn rollback(&mut self) -> OrderResult<()>;
}
