use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use order_core::{MemoryStore, OrderManager, OrderRequest, Product, ProductTally, StockPolicy};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::runtime::Runtime; // To run async code within Criterion

const CATALOG_SIZE: i32 = 64;

fn bench_store() -> MemoryStore {
  MemoryStore::with_products(
    (1..=CATALOG_SIZE).map(|id| Product::new(id, format!("product_{}", id), Decimal::new(100 + id as i64, 2), i32::MAX / 2)),
  )
}

/// `units` ids spread over `distinct` products.
fn product_ids(units: usize, distinct: usize) -> Vec<i32> {
  (0..units).map(|i| (i % distinct) as i32 + 1).collect()
}

fn bench_product_tally(c: &mut Criterion) {
  let mut group = c.benchmark_group("ProductTally");
  for units in [1usize, 16, 256].iter() {
    let ids = product_ids(*units, 8);
    group.throughput(Throughput::Elements(*units as u64));
    group.bench_with_input(BenchmarkId::from_parameter(units), &ids, |b, ids| {
      b.iter(|| ProductTally::from_ids(ids))
    });
  }
  group.finish();
}

fn bench_create_order(c: &mut Criterion) {
  let mut group = c.benchmark_group("CreateOrderMemory");
  let rt = Runtime::new().unwrap();

  for policy in [StockPolicy::CheckOnly, StockPolicy::Reserve] {
    for units in [1usize, 8, 64].iter() {
      let manager = Arc::new(OrderManager::new(Arc::new(bench_store()), policy));
      let ids = product_ids(*units, 16);

      group.throughput(Throughput::Elements(*units as u64));
      group.bench_with_input(
        BenchmarkId::new(format!("{}", policy), units),
        &ids,
        |b, ids| {
          b.to_async(&rt).iter_batched(
            || OrderRequest::new(1, "New", ids.clone()),
            |request| {
              let manager = manager.clone();
              async move { manager.create_order(request).await.unwrap() }
            },
            criterion::BatchSize::SmallInput,
          );
        },
      );
    }
  }
  group.finish();
}

criterion_group!(benches, bench_product_tally, bench_create_order);
criterion_main!(benches);
