use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lexstore::LexStore;
use tempfile::TempDir;

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_1kb", |b| {
        let dir = TempDir::new().unwrap();
        let db = LexStore::open(dir.path()).unwrap();
        let data = "x".repeat(1024);
        let mut counter = 0u64;

        b.iter(|| {
            db.set(&format!("word-{}", counter % 100), &data).unwrap();
            counter += 1;
        });
    });
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_1kb", |b| {
        let dir = TempDir::new().unwrap();
        let db = LexStore::open(dir.path()).unwrap();
        let data = "x".repeat(1024);

        for i in 0..100 {
            db.set(&format!("word-{}", i), &data).unwrap();
        }

        b.iter(|| {
            black_box(db.get("word-50").unwrap());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_set, bench_get);
criterion_main!(benches);
