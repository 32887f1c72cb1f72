// order_core/src/models/product.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The slice of a catalog product the order engine reads: how many units are
/// on hand and what one unit costs right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: i32,
  pub name: String,
  pub price: Decimal,
  pub quantity: i32,
}

impl Product {
  pub fn new(id: i32, name: impl Into<String>, price: Decimal, quantity: i32) -> Self {
    Self {
      id,
      name: name.into(),
      price,
      quantity,
    }
  }
}
