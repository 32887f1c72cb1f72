// order_core/src/models/mod.rs

//! Data structures for orders, their line items and the products they reference.

pub mod order;
pub mod order_item;
pub mod product;
pub mod search;

pub use order::{assemble_orders, Order, OrderLineRow, OrderRequest};
pub use order_item::OrderLineItem;
pub use product::Product;
pub use search::{OrderFilter, OrderSearch};
