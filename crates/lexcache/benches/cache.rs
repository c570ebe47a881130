use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lexcache::{ExpiringCache, LocalStore};
use lexstore::{LexStore, MemoryStore};
use tempfile::TempDir;

fn bench_cached_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_memory", |b| {
        let cache: ExpiringCache<Vec<String>> = ExpiringCache::new(Arc::new(MemoryStore::new()));
        let entry = vec!["x".repeat(64); 16];
        for i in 0..100 {
            cache.set(&format!("word{}", i), &entry);
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(cache.get(&format!("word{}", counter % 100)));
            counter += 1;
        });
    });

    group.bench_function("get_file", |b| {
        let dir = TempDir::new().unwrap();
        let cache: ExpiringCache<Vec<String>> =
            ExpiringCache::new(Arc::new(LexStore::open(dir.path()).unwrap()));
        let entry = vec!["x".repeat(64); 16];
        for i in 0..100 {
            cache.set(&format!("word{}", i), &entry);
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(cache.get(&format!("word{}", counter % 100)));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_to_full_history", |b| {
        let local = LocalStore::new(Arc::new(MemoryStore::new()));
        for i in 0..100 {
            local.add_to_history(&format!("word{}", i));
        }

        let mut counter = 0;
        b.iter(|| {
            local.add_to_history(&format!("word{}", counter % 150));
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cached_get, bench_history);
criterion_main!(benches);
