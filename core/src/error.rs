// order_core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
  #[error("Invalid order request: {0}")]
  Validation(String),

  #[error("Product not found: {product_id}")]
  ProductNotFound { product_id: i32 },

  #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: i32,
    requested: i32,
    available: i32,
  },

  #[error("Order not found: {order_id}")]
  OrderNotFound { order_id: i32 },

  /// Connection loss, constraint violation or any other failure inside the store.
  /// The surrounding transaction has been rolled back when this is returned.
  #[error("Storage failure: {source}")]
  Storage {
    #[source]
    source: AnyhowError,
  },
}

impl OrderError {
  pub fn storage(message: impl Into<String>) -> Self {
    OrderError::Storage {
      source: anyhow::anyhow!(message.into()),
    }
  }

  /// Whether the caller may retry the whole operation unchanged.
  /// Business rejections are deterministic, so only storage failures qualify.
  pub fn is_retryable(&self) -> bool {
    matches!(self, OrderError::Storage { .. })
  }
}

impl From<sqlx::Error> for OrderError {
  fn from(err: sqlx::Error) -> Self {
    OrderError::Storage { source: err.into() }
  }
}

pub type OrderResult<T, E = OrderError> = std::result::Result<T, E>;
