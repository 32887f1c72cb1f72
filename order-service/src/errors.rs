// order-service/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use order_core::OrderError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Order Error: {source}")]
  Order {
    #[from] // Allows conversion from order_core::OrderError
    source: OrderError,
  },
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Order { source } => match source {
        OrderError::Validation(_) => StatusCode::BAD_REQUEST,
        OrderError::ProductNotFound { .. } | OrderError::OrderNotFound { .. } => StatusCode::NOT_FOUND,
        OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
        OrderError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Log the full error when it's turned into a response
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }

    let body = match self {
      AppError::Validation(m) | AppError::NotFound(m) => json!({"error": m}),
      AppError::Config(m) => json!({"error": "Configuration issue", "detail": m}),
      AppError::Sqlx(_) => json!({"error": "Database operation failed"}),
      AppError::Order { source } => match source {
        OrderError::Validation(m) => json!({"error": m}),
        OrderError::ProductNotFound { product_id } => {
          json!({"error": source.to_string(), "product_id": product_id})
        }
        OrderError::OrderNotFound { order_id } => json!({"error": source.to_string(), "order_id": order_id}),
        OrderError::InsufficientStock {
          product_id,
          requested,
          available,
        } => json!({
          "error": source.to_string(),
          "product_id": product_id,
          "requested": requested,
          "available": available,
        }),
        // Driver details stay in the logs.
        OrderError::Storage { .. } => json!({"error": "Database operation failed", "retryable": true}),
      },
    };

    HttpResponse::build(status).json(body)
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
