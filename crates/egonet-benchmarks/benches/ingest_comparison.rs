//! Ingest throughput of both stores by network size and batch size
//!
//! Run with:
//! ```bash
//! cargo bench -p egonet-benchmarks --bench ingest_comparison
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use egonet_benchmarks::{graph_store, network, relational_store, BATCH_SIZES, NETWORK_SIZES};
use egonet_core::EgoNetworkStore;
use std::time::{Duration, Instant};

fn bench_ingest_by_size(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("ingest_by_size");
    group.sample_size(10);

    for users in NETWORK_SIZES {
        let net = network(users);
        group.throughput(Throughput::Elements(users as u64));

        // every sample starts from an empty store; only the import is timed
        group.bench_with_input(BenchmarkId::new("surrealdb", users), &net, |b, net| {
            b.to_async(&rt).iter_custom(|iters| {
                let net = net.clone();
                async move {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        let store = graph_store(50_000).await;
                        let start = Instant::now();
                        store.ingest_ego_network(net.clone()).await.unwrap();
                        total += start.elapsed();
                    }
                    total
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("sqlite", users), &net, |b, net| {
            b.to_async(&rt).iter_custom(|iters| {
                let net = net.clone();
                async move {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        let (_dir, store) = relational_store(50_000);
                        let start = Instant::now();
                        store.ingest_ego_network(net.clone()).await.unwrap();
                        total += start.elapsed();
                    }
                    total
                }
            });
        });
    }
    group.finish();
}

fn bench_ingest_by_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("ingest_by_batch");
    group.sample_size(10);
    let net = network(NETWORK_SIZES[1]);

    for batch_size in BATCH_SIZES {
        group.bench_with_input(
            BenchmarkId::new("surrealdb", batch_size),
            &batch_size,
            |b, &batch_size| {
                b.to_async(&rt).iter_custom(|iters| {
                    let net = net.clone();
                    async move {
                        let mut total = Duration::ZERO;
                        for _ in 0..iters {
                            let store = graph_store(batch_size).await;
                            let start = Instant::now();
                            store.ingest_ego_network(net.clone()).await.unwrap();
                            total += start.elapsed();
                        }
                        total
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sqlite", batch_size),
            &batch_size,
            |b, &batch_size| {
                b.to_async(&rt).iter_custom(|iters| {
                    let net = net.clone();
                    async move {
                        let mut total = Duration::ZERO;
                        for _ in 0..iters {
                            let (_dir, store) = relational_store(batch_size);
                            let start = Instant::now();
                            store.ingest_ego_network(net.clone()).await.unwrap();
                            total += start.elapsed();
                        }
                        total
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_ingest_by_size, bench_ingest_by_batch);
criterion_main!(benches);
