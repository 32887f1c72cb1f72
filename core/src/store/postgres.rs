// order_core/src/store/postgres.rs

//! PostgreSQL `OrderStore` over a sqlx pool. Expects the tables in `schema.sql`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use super::{OrderScope, OrderStore, OrderTransaction};
use crate::error::{OrderError, OrderResult};
use crate::inventory::InventoryLedger;
use crate::models::OrderLineRow;

const SELECT_ALL_ORDER_ROWS: &str = r#"
  SELECT o.id, o.user_id, o.total_price, o.order_date, o.status, op.product_id
  FROM orders AS o
  LEFT JOIN orders_products AS op ON o.id = op.order_id
  ORDER BY o.id, op.id"#;

const SELECT_ORDER_ROWS_BY_ID: &str = r#"
  SELECT o.id, o.user_id, o.total_price, o.order_date, o.status, op.product_id
  FROM orders AS o
  LEFT JOIN orders_products AS op ON o.id = op.order_id
  WHERE o.id = $1
  ORDER BY op.id"#;

const SELECT_ORDER_ROWS_BY_USER: &str = r#"
  SELECT o.id, o.user_id, o.total_price, o.order_date, o.status, op.product_id
  FROM orders AS o
  LEFT JOIN orders_products AS op ON o.id = op.order_id
  WHERE o.user_id = $1
  ORDER BY o.id, op.id"#;

const SELECT_ORDER_ROWS_BY_STATUS: &str = r#"
  SELECT o.id, o.user_id, o.total_price, o.order_date, o.status, op.product_id
  FROM orders AS o
  LEFT JOIN orders_products AS op ON o.id = op.order_id
  WHERE o.status = $1
  ORDER BY o.id, op.id"#;

#[derive(Debug, Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  async fn begin(&self) -> OrderResult<Box<dyn OrderTransaction>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgTransaction { tx: Some(tx) }))
  }

  #[instrument(name = "pg_store::order_rows", skip(self), err(Display))]
  async fn order_rows(&self, scope: OrderScope) -> OrderResult<Vec<OrderLineRow>> {
    let rows = match scope {
      OrderScope::All => {
        sqlx::query_as::<_, OrderLineRow>(SELECT_ALL_ORDER_ROWS)
          .fetch_all(&self.pool)
          .await?
      }
      OrderScope::ById(order_id) => {
        sqlx::query_as::<_, OrderLineRow>(SELECT_ORDER_ROWS_BY_ID)
          .bind(order_id)
          .fetch_all(&self.pool)
          .await?
      }
      OrderScope::ByUser(user_id) => {
        sqlx::query_as::<_, OrderLineRow>(SELECT_ORDER_ROWS_BY_USER)
          .bind(user_id)
          .fetch_all(&self.pool)
          .await?
      }
      OrderScope::ByStatus(status) => {
        sqlx::query_as::<_, OrderLineRow>(SELECT_ORDER_ROWS_BY_STATUS)
          .bind(status)
          .fetch_all(&self.pool)
          .await?
      }
    };
    debug!(rows = rows.len(), "Fetched order rows.");
    Ok(rows)
  }
}

struct PgTransaction {
  tx: Option<Transaction<'static, Postgres>>,
}

impl PgTransaction {
  fn conn(&mut self) -> OrderResult<&mut PgConnection> {
    self
      .tx
      .as_deref_mut()
      .ok_or_else(|| OrderError::storage("transaction already finished"))
  }
}

#[async_trait]
impl InventoryLedger for PgTransaction {
  /// Also locks the row, for callers that skipped `lock_products`.
  async fn available_quantity(&mut self, product_id: i32) -> OrderResult<i32> {
    sqlx::query_scalar::<_, i32>("SELECT quantity FROM products WHERE id = $1 FOR UPDATE")
      .bind(product_id)
      .fetch_optional(self.conn()?)
      .await?
      .ok_or(OrderError::ProductNotFound { product_id })
  }

  async fn unit_price(&mut self, product_id: i32) -> OrderResult<Decimal> {
    sqlx::query_scalar::<_, Decimal>("SELECT price FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(self.conn()?)
      .await?
      .ok_or(OrderError::ProductNotFound { product_id })
  }
}

#[async_trait]
impl OrderTransaction for PgTransaction {
  async fn lock_order(&mut self, order_id: i32) -> OrderResult<Option<Vec<i32>>> {
    let locked = sqlx::query_scalar::<_, i32>("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
      .bind(order_id)
      .fetch_optional(self.conn()?)
      .await?;
    if locked.is_none() {
      return Ok(None);
    }
    let product_ids =
      sqlx::query_scalar::<_, i32>("SELECT product_id FROM orders_products WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(self.conn()?)
        .await?;
    Ok(Some(product_ids))
  }

  async fn lock_products(&mut self, product_ids: &[i32]) -> OrderResult<()> {
    let mut ids = product_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
      return Ok(());
    }
    // Missing ids are skipped here; the stock check reports them.
    let locked = sqlx::query_scalar::<_, i32>("SELECT id FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
      .bind(&ids)
      .fetch_all(self.conn()?)
      .await?;
    debug!(requested = ids.len(), locked = locked.len(), "Locked product rows.");
    Ok(())
  }

  async fn insert_order(&mut self, user_id: i32, status: &str, total_price: Decimal) -> OrderResult<i32> {
    let id = sqlx::query_scalar::<_, i32>(
      "INSERT INTO orders (user_id, total_price, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(total_price)
    .bind(status)
    .fetch_one(self.conn()?)
    .await?;
    Ok(id)
  }

  async fn update_order(
    &mut self,
    order_id: i32,
    user_id: i32,
    status: &str,
    total_price: Decimal,
  ) -> OrderResult<bool> {
    let result = sqlx::query("UPDATE orders SET user_id = $1, total_price = $2, status = $3 WHERE id = $4")
      .bind(user_id)
      .bind(total_price)
      .bind(status)
      .bind(order_id)
      .execute(self.conn()?)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_order(&mut self, order_id: i32) -> OrderResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(order_id)
      .execute(self.conn()?)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn insert_line_items(&mut self, order_id: i32, product_ids: &[i32]) -> OrderResult<()> {
    // WITH ORDINALITY keeps row ids in the same order as the input.
    sqlx::query(
      r#"
      INSERT INTO orders_products (order_id, product_id)
      SELECT $1, p.product_id
      FROM UNNEST($2::int4[]) WITH ORDINALITY AS p(product_id, position)
      ORDER BY p.position"#,
    )
    .bind(order_id)
    .bind(product_ids)
    .execute(self.conn()?)
    .await?;
    Ok(())
  }

  async fn delete_line_items(&mut self, order_id: i32) -> OrderResult<u64> {
    let result = sqlx::query("DELETE FROM orders_products WHERE order_id = $1")
      .bind(order_id)
      .execute(self.conn()?)
      .await?;
    Ok(result.rows_affected())
  }

  async fn adjust_stock(&mut self, product_id: i32, delta: i32) -> OrderResult<()> {
    let adjusted = sqlx::query_scalar::<_, i32>(
      "UPDATE products SET quantity = quantity + $2 WHERE id = $1 AND quantity + $2 >= 0 RETURNING quantity",
    )
    .bind(product_id)
    .bind(delta)
    .fetch_optional(self.conn()?)
    .await?;
    if adjusted.is_some() {
      return Ok(());
    }

    let available = self.available_quantity(product_id).await?;
    Err(OrderError::InsufficientStock {
      product_id,
      requested: -delta,
      available,
    })
  }

  async fn commit(&mut self) -> OrderResult<()> {
    let tx = self
      .tx
      .take()
      .ok_or_else(|| OrderError::storage("transaction already finished"))?;
    tx.commit().await?;
    Ok(())
  }

  async fn rollback(&mut self) -> OrderResult<()> {
    if let Some(tx) = self.tx.take() {
      tx.rollback().await?;
    }
    Ok(())
  }
}
