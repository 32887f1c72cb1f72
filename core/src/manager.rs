// order_core/src/manager.rs

//! The order transaction manager.
//!
//! Every write runs as one atomic unit on the configured `OrderStore`: stock is
//! checked (and reserved, depending on `StockPolicy`), the total is priced from
//! current unit prices, and the header and its complete line-item set are
//! written. Any failure rolls the whole unit back. The manager holds no state
//! between calls and can be shared freely between request handlers.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::{OrderError, OrderResult};
use crate::inventory::{verify_stock, ProductTally, StockPolicy};
use crate::models::{assemble_orders, Order, OrderRequest, OrderSearch};
use crate::pricing::price_order;
use crate::store::{OrderScope, OrderStore, OrderTransaction};

#[derive(Clone)]
pub struct OrderManager {
  store: Arc<dyn OrderStore>,
  policy: StockPolicy,
}

impl OrderManager {
  pub fn new(store: Arc<dyn OrderStore>, policy: StockPolicy) -> Self {
    Self { store, policy }
  }

  pub fn policy(&self) -> StockPolicy {
    self.policy
  }

  /// Returns the id storage assigned to the new order.
  #[instrument(
    name = "order_manager::create_order",
    skip(self, request),
    fields(user_id = request.user_id, units = request.product_ids.len(), policy = %self.policy)
  )]
  pub async fn create_order(&self, request: OrderRequest) -> OrderResult<i32> {
    request.validate().inspect_err(log_failure)?;
    let tally = ProductTally::from_ids(&request.product_ids);

    let mut tx = self.store.begin().await?;
    let outcome = self.write_new_order(tx.as_mut(), &request, &tally).await;
    let order_id = finish(tx, outcome).await?;

    info!(order_id, "Order created.");
    Ok(order_id)
  }

  /// Rewrites header fields and replaces the full line-item set.
  #[instrument(
    name = "order_manager::update_order",
    skip(self, request),
    fields(user_id = request.user_id, units = request.product_ids.len(), policy = %self.policy)
  )]
  pub async fn update_order(&self, order_id: i32, request: OrderRequest) -> OrderResult<()> {
    request.validate().inspect_err(log_failure)?;
    let tally = ProductTally::from_ids(&request.product_ids);

    let mut tx = self.store.begin().await?;
    let outcome = self.rewrite_order(tx.as_mut(), order_id, &request, &tally).await;
    finish(tx, outcome).await?;

    info!("Order updated.");
    Ok(())
  }

  /// Removes the header and its line items together.
  #[instrument(name = "order_manager::delete_order", skip(self), fields(policy = %self.policy))]
  pub async fn delete_order(&self, order_id: i32) -> OrderResult<()> {
    let mut tx = self.store.begin().await?;
    let outcome = self.remove_order(tx.as_mut(), order_id).await;
    finish(tx, outcome).await?;

    info!("Order deleted.");
    Ok(())
  }

  #[instrument(name = "order_manager::get_order", skip(self))]
  pub async fn get_order(&self, order_id: i32) -> OrderResult<Order> {
    let rows = self.store.order_rows(OrderScope::ById(order_id)).await.inspect_err(log_failure)?;
    assemble_orders(rows)
      .into_iter()
      .next()
      .ok_or(OrderError::OrderNotFound { order_id })
      .inspect_err(log_failure)
  }

  #[instrument(name = "order_manager::list_orders", skip(self))]
  pub async fn list_orders(&self) -> OrderResult<Vec<Order>> {
    self.fetch(OrderScope::All).await
  }

  #[instrument(name = "order_manager::orders_by_user", skip(self))]
  pub async fn orders_by_user(&self, user_id: i32) -> OrderResult<Vec<Order>> {
    self.fetch(OrderScope::ByUser(user_id)).await
  }

  #[instrument(name = "order_manager::orders_by_status", skip(self))]
  pub async fn orders_by_status(&self, status: &str) -> OrderResult<Vec<Order>> {
    self.fetch(OrderScope::ByStatus(status.to_string())).await
  }

  /// Applies exactly one filter from `search`; see `OrderSearch::filter`.
  pub async fn search(&self, search: &OrderSearch) -> OrderResult<Vec<Order>> {
    let filter = search.filter().inspect_err(log_failure)?;
    self.fetch(filter.into()).await
  }

  async fn fetch(&self, scope: OrderScope) -> OrderResult<Vec<Order>> {
    let rows = self.store.order_rows(scope).await.inspect_err(log_failure)?;
    Ok(assemble_orders(rows))
  }

  async fn write_new_order(
    &self,
    tx: &mut dyn OrderTransaction,
    request: &OrderRequest,
    tally: &ProductTally,
  ) -> OrderResult<i32> {
    lock_products(tx, &[tally]).await?;
    self.take_stock(tx, tally).await?;
    let total_price = price_order(&mut *tx, tally).await?;
    let order_id = tx.insert_order(request.user_id, &request.status, total_price).await?;
    tx.insert_line_items(order_id, &request.product_ids).await?;
    Ok(order_id)
  }

  async fn rewrite_order(
    &self,
    tx: &mut dyn OrderTransaction,
    order_id: i32,
    request: &OrderRequest,
    tally: &ProductTally,
  ) -> OrderResult<()> {
    let previous = tx
      .lock_order(order_id)
      .await?
      .ok_or(OrderError::OrderNotFound { order_id })?;
    let previous = ProductTally::from_ids(&previous);
    match self.policy {
      StockPolicy::Reserve => lock_products(tx, &[&previous, tally]).await?,
      StockPolicy::CheckOnly => lock_products(tx, &[tally]).await?,
    }
    self.return_stock(tx, &previous).await?;

    self.take_stock(tx, tally).await?;
    let total_price = price_order(&mut *tx, tally).await?;
    if !tx
      .update_order(order_id, request.user_id, &request.status, total_price)
      .await?
    {
      return Err(OrderError::OrderNotFound { order_id });
    }
    tx.delete_line_items(order_id).await?;
    tx.insert_line_items(order_id, &request.product_ids).await?;
    Ok(())
  }

  async fn remove_order(&self, tx: &mut dyn OrderTransaction, order_id: i32) -> OrderResult<()> {
    let previous = tx
      .lock_order(order_id)
      .await?
      .ok_or(OrderError::OrderNotFound { order_id })?;
    let previous = ProductTally::from_ids(&previous);
    if self.policy == StockPolicy::Reserve {
      lock_products(tx, &[&previous]).await?;
    }
    self.return_stock(tx, &previous).await?;

    tx.delete_line_items(order_id).await?;
    if !tx.delete_order(order_id).await? {
      return Err(OrderError::OrderNotFound { order_id });
    }
    Ok(())
  }

  async fn take_stock(&self, tx: &mut dyn OrderTransaction, tally: &ProductTally) -> OrderResult<()> {
    verify_stock(&mut *tx, tally).await?;
    if self.policy == StockPolicy::Reserve {
      for (product_id, count) in tally.iter() {
        tx.adjust_stock(product_id, -count).await?;
      }
    }
    Ok(())
  }

  async fn return_stock(&self, tx: &mut dyn OrderTransaction, tally: &ProductTally) -> OrderResult<()> {
    if self.policy == StockPolicy::Reserve {
      for (product_id, count) in tally.iter() {
        tx.adjust_stock(product_id, count).await?;
      }
    }
    Ok(())
  }
}

/// Business rejections are expected traffic and log at warn; only storage
/// failures log at error.
fn log_failure(err: &OrderError) {
  match err {
    OrderError::Storage { .. } => error!(error = %err, "Storage failure."),
    _ => warn!(error = %err, "Order operation rejected."),
  }
}

/// Takes every product row lock the unit will need in a single ascending
/// pass, so two writers touching overlapping products queue instead of
/// deadlocking.
async fn lock_products(tx: &mut dyn OrderTransaction, tallies: &[&ProductTally]) -> OrderResult<()> {
  let mut product_ids: Vec<i32> = tallies
    .iter()
    .flat_map(|tally| tally.iter().map(|(product_id, _)| product_id))
    .collect();
  product_ids.sort_unstable();
  product_ids.dedup();
  tx.lock_products(&product_ids).await
}

/// Commits on success; otherwise rolls back and hands the original error on.
async fn finish<T>(mut tx: Box<dyn OrderTransaction>, outcome: OrderResult<T>) -> OrderResult<T> {
  match outcome {
    Ok(value) => {
      if let Err(err) = tx.commit().await {
        error!(error = %err, "Commit failed, rolling back.");
        if let Err(rollback_err) = tx.rollback().await {
          warn!(error = %rollback_err, "Rollback after failed commit also failed.");
        }
        return Err(err);
      }
      Ok(value)
    }
    Err(err) => {
      log_failure(&err);
      if let Err(rollback_err) = tx.rollback().await {
        warn!(error = %rollback_err, "Rollback failed.");
      }
      Err(err)
    }
  }
}
