// order_core/src/inventory.rs

//! Read side of the product catalog as seen by an order transaction, plus the
//! stock checks and reservations performed against it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{OrderError, OrderResult};

/// Authoritative quantity and unit price of products.
///
/// Implementations used by the order engine are transaction handles, so every
/// read lands inside the same atomic unit as the order write that follows it.
#[async_trait]
pub trait InventoryLedger: Send {
  async fn available_quantity(&mut self, product_id: i32) -> OrderResult<i32>;

  async fn unit_price(&mut self, product_id: i32) -> OrderResult<Decimal>;
}

/// What an order does to stock levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
  /// Verify availability only. Stock is never decremented, so repeated orders
  /// are not constrained cumulatively.
  #[default]
  CheckOnly,
  /// Verify availability and decrement it in the same transaction. Updates and
  /// deletes return the order's previous units to stock.
  Reserve,
}

impl FromStr for StockPolicy {
  type Err = OrderError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "check_only" | "check-only" | "check" => Ok(StockPolicy::CheckOnly),
      "reserve" => Ok(StockPolicy::Reserve),
      other => Err(OrderError::Validation(format!(
        "unknown stock policy '{}', expected 'check_only' or 'reserve'",
        other
      ))),
    }
  }
}

impl fmt::Display for StockPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StockPolicy::CheckOnly => f.write_str("check_only"),
      StockPolicy::Reserve => f.write_str("reserve"),
    }
  }
}

/// Requested units per distinct product.
///
/// Iteration is in ascending product id, which is also the order rows get
/// locked in, so two transactions never wait on each other crosswise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductTally(BTreeMap<i32, i32>);

impl ProductTally {
  pub fn from_ids(product_ids: &[i32]) -> Self {
    let mut counts = BTreeMap::new();
    for product_id in product_ids {
      *counts.entry(*product_id).or_insert(0) += 1;
    }
    ProductTally(counts)
  }

  pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
    self.0.iter().map(|(id, count)| (*id, *count))
  }

  pub fn count_of(&self, product_id: i32) -> i32 {
    self.0.get(&product_id).copied().unwrap_or(0)
  }

  pub fn distinct_products(&self) -> usize {
    self.0.len()
  }

  pub fn total_units(&self) -> i32 {
    self.0.values().sum()
  }
}

/// Fails with `InsufficientStock` on the first product whose available quantity
/// is below its requested count. Each product is checked once against its full count.
pub async fn verify_stock<L>(ledger: &mut L, tally: &ProductTally) -> OrderResult<()>
where
  L: InventoryLedger + ?Sized,
{
  for (product_id, requested) in tally.iter() {
    let available = ledger.available_quantity(product_id).await?;
    if available < requested {
      warn!(product_id, requested, available, "Insufficient stock.");
      return Err(OrderError::InsufficientStock {
        product_id,
        requested,
        available,
      });
    }
    debug!(product_id, requested, available, "Stock sufficient.");
  }
  Ok(())
}
