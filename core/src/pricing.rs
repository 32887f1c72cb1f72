// order_core/src/pricing.rs

//! Order totals from current unit prices.

use rust_decimal::Decimal;

use crate::error::OrderResult;
use crate::inventory::{InventoryLedger, ProductTally};

/// Sum over distinct products of unit price times requested count.
/// Propagates `ProductNotFound` from the ledger.
pub async fn price_order<L>(ledger: &mut L, tally: &ProductTally) -> OrderResult<Decimal>
where
  L: InventoryLedger + ?Sized,
{
  let mut total = Decimal::ZERO;
  for (product_id, count) in tally.iter() {
    let unit_price = ledger.unit_price(product_id).await?;
    total += line_total(unit_price, count);
  }
  Ok(total)
}

pub fn line_total(unit_price: Decimal, count: i32) -> Decimal {
  unit_price * Decimal::from(count)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::OrderError;
  use crate::inventory::verify_stock;
  use async_trait::async_trait;
  use std::collections::HashMap;

  /// Fixed catalog: product id -> (quantity, price).
  struct Catalog(HashMap<i32, (i32, Decimal)>);

  #[async_trait]
  impl InventoryLedger for Catalog {
    async fn available_quantity(&mut self, product_id: i32) -> OrderResult<i32> {
      self
        .0
        .get(&product_id)
        .map(|(quantity, _)| *quantity)
        .ok_or(OrderError::ProductNotFound { product_id })
    }

    async fn unit_price(&mut self, product_id: i32) -> OrderResult<Decimal> {
      self
        .0
        .get(&product_id)
        .map(|(_, price)| *price)
        .ok_or(OrderError::ProductNotFound { product_id })
    }
  }

  fn catalog() -> Catalog {
    Catalog(HashMap::from([
      (1, (5, Decimal::new(1999, 2))),
      (2, (2, Decimal::new(350, 2))),
      (3, (0, Decimal::new(10, 1))),
    ]))
  }

  #[tokio::test]
  async fn duplicates_are_summed_not_deduplicated() {
    let tally = ProductTally::from_ids(&[1, 2, 1, 1]);
    let total = price_order(&mut catalog(), &tally).await.unwrap();
    // 3 x 19.99 + 1 x 3.50
    assert_eq!(total, Decimal::new(6347, 2));
  }

  #[tokio::test]
  async fn unknown_product_fails_pricing() {
    let tally = ProductTally::from_ids(&[1, 42]);
    match price_order(&mut catalog(), &tally).await {
      Err(OrderError::ProductNotFound { product_id }) => assert_eq!(product_id, 42),
      other => panic!("Expected ProductNotFound, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn stock_is_checked_against_the_full_count() {
    let mut ledger = catalog();
    assert!(verify_stock(&mut ledger, &ProductTally::from_ids(&[2, 2])).await.is_ok());

    match verify_stock(&mut ledger, &ProductTally::from_ids(&[2, 2, 2])).await {
      Err(OrderError::InsufficientStock {
        product_id,
        requested,
        available,
      }) => {
        assert_eq!((product_id, requested, available), (2, 3, 2));
      }
      other => panic!("Expected InsufficientStock, got {:?}", other),
    }
  }

  #[test]
  fn tally_groups_ids_in_ascending_order() {
    let tally = ProductTally::from_ids(&[9, 3, 9, 1, 9]);
    assert_eq!(tally.iter().collect::<Vec<_>>(), vec![(1, 1), (3, 1), (9, 3)]);
    assert_eq!(tally.count_of(9), 3);
    assert_eq!(tally.count_of(4), 0);
    assert_eq!(tally.distinct_products(), 3);
    assert_eq!(tally.total_units(), 5);
  }
}
