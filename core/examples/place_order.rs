// examples/place_order.rs
//
// Walks one order through create, rejected create, update and delete on the
// in-memory store. Run with: cargo run -p order_core --example place_order

use order_core::{MemoryStore, OrderError, OrderManager, OrderRequest, Product, StockPolicy};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), OrderError> {
  tracing_subscriber::fmt().with_max_level(Level::INFO).init();

  let store = MemoryStore::with_products(vec![
    Product::new(1, "Espresso beans 1kg", Decimal::new(2450, 2), 3),
    Product::new(2, "Paper filters", Decimal::new(399, 2), 20),
  ]);
  let manager = OrderManager::new(Arc::new(store.clone()), StockPolicy::Reserve);

  let order_id = manager
    .create_order(OrderRequest::new(42, "New", vec![1, 1, 2]))
    .await?;
  let order = manager.get_order(order_id).await?;
  println!(
    "Created order {} for user {}: {:?}, total {}",
    order.id, order.user_id, order.product_ids, order.total_price
  );

  match manager.create_order(OrderRequest::new(7, "New", vec![1, 1])).await {
    Err(err) => println!("Second order rejected: {}", err),
    Ok(id) => println!("Unexpectedly created order {}", id),
  }

  manager
    .update_order(order_id, OrderRequest::new(42, "Shipped", vec![2]))
    .await?;
  let order = manager.get_order(order_id).await?;
  println!("Updated order {}: {:?}, total {}, status {}", order.id, order.product_ids, order.total_price, order.status);

  manager.delete_order(order_id).await?;
  if let Some(beans) = store.product(1).await {
    println!("Order deleted; {} units of '{}' back in stock", beans.quantity, beans.name);
  }
  Ok(())
}
