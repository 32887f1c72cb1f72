// order_core/src/models/search.rs

use serde::Deserialize;

use crate::error::{OrderError, OrderResult};

/// Raw search parameters. Only one filter is ever applied: `user_id` wins over
/// `status`, and the other is ignored rather than combined.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSearch {
  #[serde(default, alias = "user")]
  pub user_id: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderFilter {
  User(i32),
  Status(String),
}

impl OrderSearch {
  pub fn filter(&self) -> OrderResult<OrderFilter> {
    if let Some(user_id) = self.user_id.as_deref().filter(|v| !v.is_empty()) {
      let parsed = user_id
        .parse::<i32>()
        .map_err(|e| OrderError::Validation(format!("invalid user_id '{}': {}", user_id, e)))?;
      return Ok(OrderFilter::User(parsed));
    }
    if let Some(status) = self.status.as_deref().filter(|v| !v.is_empty()) {
      return Ok(OrderFilter::Status(status.to_string()));
    }
    Err(OrderError::Validation(
      "search requires a user_id or status parameter".to_string(),
    ))
  }
}
