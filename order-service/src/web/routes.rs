// order-service/src/web/routes.rs

use actix_web::{error, web, HttpRequest};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::order_handlers;

async fn health_check_handler(app_state: web::Data<AppState>) -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({
    "status": "ok",
    "store": format!("{:?}", app_state.config.store_backend).to_lowercase(),
    "stock_policy": app_state.orders.policy().to_string(),
  }))
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid query string: {}", err)).into()
}

// Called from `main.rs` (and the handler tests) to mount the order service.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("", web::post().to(order_handlers::create_order_handler))
            // Registered before "/{id}" so "search" is never taken for an id.
            .route("/search", web::get().to(order_handlers::search_orders_handler))
            .route("/{id:\\d+}", web::get().to(order_handlers::get_order_handler))
            .route("/{id:\\d+}", web::put().to(order_handlers::update_order_handler))
            .route("/{id:\\d+}", web::delete().to(order_handlers::delete_order_handler)),
        ),
    );
}
