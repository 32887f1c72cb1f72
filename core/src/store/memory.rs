// order_core/src/store/memory.rs

//! In-memory `OrderStore`.
//!
//! All state sits behind one async mutex. A transaction owns that mutex for its
//! whole life and works on a private copy of the state, which replaces the
//! shared state on commit. Transactions are therefore fully serialised.
//!
//! Meant for tests and local runs: `begin` copies every order and line item,
//! so write cost grows with the number of stored orders. Use `PgOrderStore`
//! for anything long-lived.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use super::{OrderScope, OrderStore, OrderTransaction};
use crate::error::{OrderError, OrderResult};
use crate::inventory::InventoryLedger;
use crate::models::{OrderLineItem, OrderLineRow, Product};

/// Transaction step at which an injected storage failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
  InsertOrder,
  UpdateOrder,
  DeleteOrder,
  InsertLineItems,
  DeleteLineItems,
  AdjustStock,
  Commit,
}

#[derive(Debug, Clone)]
struct StoredOrder {
  id: i32,
  user_id: i32,
  total_price: Decimal,
  order_date: DateTime<Utc>,
  status: String,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
  products: BTreeMap<i32, Product>,
  orders: Vec<StoredOrder>,
  line_items: Vec<OrderLineItem>,
  last_order_id: i32,
}

impl MemoryState {
  fn order_index(&self, order_id: i32) -> Option<usize> {
    self.orders.iter().position(|o| o.id == order_id)
  }

  fn product(&self, product_id: i32) -> OrderResult<&Product> {
    self
      .products
      .get(&product_id)
      .ok_or(OrderError::ProductNotFound { product_id })
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemoryState>>,
  fail_point: Arc<SyncMutex<Option<FailPoint>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_products<I>(products: I) -> Self
  where
    I: IntoIterator<Item = Product>,
  {
    let state = MemoryState {
      products: products.into_iter().map(|p| (p.id, p)).collect(),
      ..MemoryState::default()
    };
    Self {
      state: Arc::new(Mutex::new(state)),
      fail_point: Arc::default(),
    }
  }

  /// Inserts or replaces a catalog product. Waits for any open transaction.
  pub async fn put_product(&self, product: Product) {
    self.state.lock().await.products.insert(product.id, product);
  }

  pub async fn product(&self, product_id: i32) -> Option<Product> {
    self.state.lock().await.products.get(&product_id).cloned()
  }

  /// Every committed line item, including any whose header is gone.
  pub async fn line_items(&self) -> Vec<OrderLineItem> {
    self.state.lock().await.line_items.clone()
  }

  /// Arms a one-shot storage failure for the next transaction reaching `point`.
  pub fn fail_next(&self, point: FailPoint) {
    *self.fail_point.lock() = Some(point);
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn begin(&self) -> OrderResult<Box<dyn OrderTransaction>> {
    let guard = self.state.clone().lock_owned().await;
    let working = guard.clone();
    debug!("Memory transaction started.");
    Ok(Box::new(MemoryTransaction {
      guard: Some(guard),
      working,
      fail_point: self.fail_point.clone(),
    }))
  }

  async fn order_rows(&self, scope: OrderScope) -> OrderResult<Vec<OrderLineRow>> {
    let state = self.state.lock().await;
    let mut rows = Vec::new();

    let in_scope = |order: &StoredOrder| match &scope {
      OrderScope::All => true,
      OrderScope::ById(id) => order.id == *id,
      OrderScope::ByUser(user_id) => order.user_id == *user_id,
      OrderScope::ByStatus(status) => order.status == *status,
    };

    let headers: Vec<&StoredOrder> = state.orders.iter().filter(|o| in_scope(o)).collect();
    let mut items: HashMap<i32, Vec<i32>> = headers.iter().map(|o| (o.id, Vec::new())).collect();
    for item in &state.line_items {
      if let Some(product_ids) = items.get_mut(&item.order_id) {
        product_ids.push(item.product_id);
      }
    }

    for order in headers {
      let row = |product_id| OrderLineRow {
        id: order.id,
        user_id: order.user_id,
        total_price: order.total_price,
        order_date: order.order_date,
        status: order.status.clone(),
        product_id,
      };
      match items.remove(&order.id) {
        Some(product_ids) if !product_ids.is_empty() => {
          rows.extend(product_ids.into_iter().map(|product_id| row(Some(product_id))))
        }
        _ => rows.push(row(None)),
      }
    }

    Ok(rows)
  }
}

struct MemoryTransaction {
  guard: Option<OwnedMutexGuard<MemoryState>>,
  working: MemoryState,
  fail_point: Arc<SyncMutex<Option<FailPoint>>>,
}

impl MemoryTransaction {
  fn check(&self, point: FailPoint) -> OrderResult<()> {
    if self.guard.is_none() {
      return Err(OrderError::storage("transaction already finished"));
    }
    let mut armed = self.fail_point.lock();
    if *armed == Some(point) {
      *armed = None;
      warn!(?point, "Injected storage failure.");
      return Err(OrderError::storage(format!("injected failure at {:?}", point)));
    }
    Ok(())
  }
}

#[async_trait]
impl InventoryLedger for MemoryTransaction {
  async fn available_quantity(&mut self, product_id: i32) -> OrderResult<i32> {
    Ok(self.working.product(product_id)?.quantity)
  }

  async fn unit_price(&mut self, product_id: i32) -> OrderResult<Decimal> {
    Ok(self.working.product(product_id)?.price)
  }
}

#[async_trait]
impl OrderTransaction for MemoryTransaction {
  async fn lock_order(&mut self, order_id: i32) -> OrderResult<Option<Vec<i32>>> {
    if self.working.order_index(order_id).is_none() {
      return Ok(None);
    }
    let product_ids = self
      .working
      .line_items
      .iter()
      .filter(|item| item.order_id == order_id)
      .map(|item| item.product_id)
      .collect();
    Ok(Some(product_ids))
  }

  // The whole state is already held exclusively.
  async fn lock_products(&mut self, _product_ids: &[i32]) -> OrderResult<()> {
    Ok(())
  }

  async fn insert_order(&mut self, user_id: i32, status: &str, total_price: Decimal) -> OrderResult<i32> {
    self.check(FailPoint::InsertOrder)?;
    self.working.last_order_id += 1;
    let id = self.working.last_order_id;
    self.working.orders.push(StoredOrder {
      id,
      user_id,
      total_price,
      order_date: Utc::now(),
      status: status.to_string(),
    });
    Ok(id)
  }

  async fn update_order(
    &mut self,
    order_id: i32,
    user_id: i32,
    status: &str,
    total_price: Decimal,
  ) -> OrderResult<bool> {
    self.check(FailPoint::UpdateOrder)?;
    match self.working.order_index(order_id) {
      Some(index) => {
        let order = &mut self.working.orders[index];
        order.user_id = user_id;
        order.status = status.to_string();
        order.total_price = total_price;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_order(&mut self, order_id: i32) -> OrderResult<bool> {
    self.check(FailPoint::DeleteOrder)?;
    match self.working.order_index(order_id) {
      Some(index) => {
        self.working.orders.remove(index);
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn insert_line_items(&mut self, order_id: i32, product_ids: &[i32]) -> OrderResult<()> {
    self.check(FailPoint::InsertLineItems)?;
    if self.working.order_index(order_id).is_none() {
      return Err(OrderError::storage(format!(
        "line items reference missing order {}",
        order_id
      )));
    }
    for product_id in product_ids {
      self.working.product(*product_id)?;
      self.working.line_items.push(OrderLineItem {
        order_id,
        product_id: *product_id,
      });
    }
    Ok(())
  }

  async fn delete_line_items(&mut self, order_id: i32) -> OrderResult<u64> {
    self.check(FailPoint::DeleteLineItems)?;
    let before = self.working.line_items.len();
    self.working.line_items.retain(|item| item.order_id != order_id);
    Ok((before - self.working.line_items.len()) as u64)
  }

  async fn adjust_stock(&mut self, product_id: i32, delta: i32) -> OrderResult<()> {
    self.check(FailPoint::AdjustStock)?;
    let product = self
      .working
      .products
      .get_mut(&product_id)
      .ok_or(OrderError::ProductNotFound { product_id })?;
    let adjusted = product.quantity + delta;
    if adjusted < 0 {
      return Err(OrderError::InsufficientStock {
        product_id,
        requested: -delta,
        available: product.quantity,
      });
    }
    product.quantity = adjusted;
    Ok(())
  }

  async fn commit(&mut self) -> OrderResult<()> {
    self.check(FailPoint::Commit)?;
    if let Some(mut guard) = self.guard.take() {
      *guard = std::mem::take(&mut self.working);
    }
    debug!("Memory transaction committed.");
    Ok(())
  }

  async fn rollback(&mut self) -> OrderResult<()> {
    if self.guard.take().is_some() {
      debug!("Memory transaction rolled back.");
    }
    Ok(())
  }
}
