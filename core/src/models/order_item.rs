// order_core/src/models/order_item.rs

use serde::Serialize;

/// One unit of one product in one order. A product ordered three times yields
/// three line items; they are created and removed only together with their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLineItem {
  pub order_id: i32,
  pub product_id: i32,
}
