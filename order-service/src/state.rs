// order-service/src/state.rs
use crate::config::AppConfig;
use order_core::OrderManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub orders: Arc<OrderManager>,
  pub config: Arc<AppConfig>, // Share loaded config
}
