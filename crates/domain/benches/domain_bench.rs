use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CreateOrder, LineItemRequest, OrderRepository, UpdateOrder, Validator, seed_catalog,
};
use order_store::{InMemoryCatalog, InMemoryOrderStore};

fn items() -> Vec<LineItemRequest> {
    vec![
        LineItemRequest::new("latte", "medium")
            .with_milk("skim")
            .with_quantity(2),
        LineItemRequest::new("espresso", "small").with_shot("double"),
    ]
}

fn create_repository(
    rt: &tokio::runtime::Runtime,
) -> OrderRepository<InMemoryOrderStore, InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();
    rt.block_on(async { seed_catalog(&catalog).await.unwrap() });
    OrderRepository::new(InMemoryOrderStore::new(), catalog)
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let repository = create_repository(&rt);

    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                repository
                    .create(CreateOrder::new("take away", items()))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_conditional_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let repository = create_repository(&rt);
    let order = rt.block_on(async {
        repository
            .create(CreateOrder::new("take away", items()))
            .await
            .unwrap()
    });

    c.bench_function("domain/conditional_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let current = repository.fingerprint(order.id()).await.unwrap().unwrap();
                repository
                    .update(
                        UpdateOrder::new(order.id(), "in shop", "paid", items())
                            .if_match(Validator::exact(current)),
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_collection_fingerprint(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let repository = create_repository(&rt);
    rt.block_on(async {
        for _ in 0..1_000 {
            repository
                .create(CreateOrder::new("take away", items()))
                .await
                .unwrap();
        }
    });

    c.bench_function("domain/collection_fingerprint_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                repository.collection_fingerprint().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_conditional_update,
    bench_collection_fingerprint
);
criterion_main!(benches);
