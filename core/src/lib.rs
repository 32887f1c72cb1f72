// src/lib.rs

//! order_core: the order transaction engine.
//!
//! Given a user, a status and a multiset of product ids, the engine
//!  - groups the ids into per-product counts,
//!  - checks each product's stock once against its full count,
//!  - prices the order from current unit prices,
//!  - writes the order header and one line item per unit,
//!
//! all inside one transaction of an `OrderStore`. Reads fold the joined
//! header/line-item rows back into `Order`s.
//!
//! Two stores ship with the crate: `MemoryStore` (serialised, in-process) and
//! `PgOrderStore` (PostgreSQL through sqlx, row locks on the products touched).

pub mod error;
pub mod inventory;
pub mod manager;
pub mod models;
pub mod pricing;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::error::{OrderError, OrderResult};
pub use crate::inventory::{InventoryLedger, ProductTally, StockPolicy};
pub use crate::manager::OrderManager;
pub use crate::models::{Order, OrderFilter, OrderLineItem, OrderLineRow, OrderRequest, OrderSearch, Product};
pub use crate::pricing::price_order;
pub use crate::store::{FailPoint, MemoryStore, OrderScope, OrderStore, OrderTransaction, PgOrderStore};
