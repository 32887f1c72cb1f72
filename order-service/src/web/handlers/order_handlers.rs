// order-service/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use order_core::{OrderRequest, OrderSearch};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_orders().await?;
  if orders.is_empty() {
    return Err(AppError::NotFound("No orders found.".to_string()));
  }

  info!("Fetched {} orders.", orders.len());
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.get_order(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, req_payload),
  fields(user_id = req_payload.user_id, units = req_payload.product_ids.len())
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<OrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = app_state.orders.create_order(req_payload.into_inner()).await?;

  info!(order_id, "Order created.");
  Ok(HttpResponse::Created().json(json!({
      "message": "Order created successfully.",
      "id": order_id
  })))
}

#[instrument(
  name = "handler::update_order",
  skip(app_state, path, req_payload),
  fields(order_id = %path.as_ref(), user_id = req_payload.user_id)
)]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i32>,
  req_payload: web::Json<OrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  app_state.orders.update_order(order_id, req_payload.into_inner()).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "Order updated successfully.",
      "id": order_id
  })))
}

#[instrument(name = "handler::delete_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  app_state.orders.delete_order(order_id).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "Order deleted successfully.",
      "id": order_id
  })))
}

/// `?user_id=` (or `?user=`) takes precedence; `?status=` is used only when no user is given.
#[instrument(name = "handler::search_orders", skip(app_state, query))]
pub async fn search_orders_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrderSearch>,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.search(&query).await?;
  if orders.is_empty() {
    warn!(?query, "Search matched no orders.");
    return Err(AppError::NotFound("No orders match the search.".to_string()));
  }
  Ok(HttpResponse::Ok().json(orders))
}
