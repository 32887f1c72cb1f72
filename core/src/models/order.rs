// order_core/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

use crate::error::{OrderError, OrderResult};

/// An order header together with its line items, folded back into a product-id multiset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: i32,
  pub user_id: i32,
  /// Derived from unit prices when the order was last written; never taken from the client.
  pub total_price: Decimal,
  pub order_date: DateTime<Utc>,
  pub status: String,
  /// One entry per unit ordered, duplicates included.
  pub product_ids: Vec<i32>,
}

/// Client input for creating or rewriting an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
  pub user_id: i32,
  pub status: String,
  #[serde(default)]
  pub product_ids: Vec<i32>,
}

impl OrderRequest {
  pub fn new(user_id: i32, status: impl Into<String>, product_ids: Vec<i32>) -> Self {
    Self {
      user_id,
      status: status.into(),
      product_ids,
    }
  }

  pub fn validate(&self) -> OrderResult<()> {
    if self.user_id <= 0 {
      return Err(OrderError::Validation(format!(
        "user_id must be a positive integer, got {}",
        self.user_id
      )));
    }
    if self.status.trim().is_empty() {
      return Err(OrderError::Validation("status must not be empty".to_string()));
    }
    if self.product_ids.is_empty() {
      return Err(OrderError::Validation(
        "product_ids must contain at least one product".to_string(),
      ));
    }
    if let Some(bad) = self.product_ids.iter().find(|id| **id <= 0) {
      return Err(OrderError::Validation(format!(
        "product id must be a positive integer, got {}",
        bad
      )));
    }
    Ok(())
  }
}

/// One row of the header-to-line-item join. `product_id` is `None` for a header
/// without line items (left join).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderLineRow {
  pub id: i32,
  pub user_id: i32,
  pub total_price: Decimal,
  pub order_date: DateTime<Utc>,
  pub status: String,
  pub product_id: Option<i32>,
}

/// Folds joined rows into orders. Headers keep the order in which they first
/// appear; product ids accumulate in row order.
pub fn assemble_orders<I>(rows: I) -> Vec<Order>
where
  I: IntoIterator<Item = OrderLineRow>,
{
  let mut orders: Vec<Order> = Vec::new();
  let mut positions: HashMap<i32, usize> = HashMap::new();

  for row in rows {
    let position = *positions.entry(row.id).or_insert_with(|| {
      orders.push(Order {
        id: row.id,
        user_id: row.user_id,
        total_price: row.total_price,
        order_date: row.order_date,
        status: row.status.clone(),
        product_ids: Vec::new(),
      });
      orders.len() - 1
    });
    if let Some(product_id) = row.product_id {
      orders[position].product_ids.push(product_id);
    }
  }

  orders
}
