use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lucien::{BatchEntity, Configuration, NeverCancel, PartitionScheme, Point3, Tetree, TetreeKey};
use rand::Rng;

const LEVEL: u8 = 10;
const DOMAIN: f64 = 2000.0;

fn random_points(n: usize) -> Vec<Point3> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| {
            Point3::new(
                rng.gen_range(0.0..DOMAIN),
                rng.gen_range(0.0..DOMAIN),
                rng.gen_range(0.0..DOMAIN),
            )
        })
        .collect()
}

fn make_config() -> Configuration {
    Configuration::builder()
        .scheme(PartitionScheme::Tetree)
        .max_entities_per_node(16)
        .build()
}

fn benchmark_enclosing(c: &mut Criterion) {
    let point = Point3::new(512.3, 768.1, 1024.9);

    c.bench_function("tetree enclosing (uncached)", |b| {
        b.iter(|| TetreeKey::from_point(black_box(&point), black_box(LEVEL)))
    });
}

fn benchmark_sequential_insert(c: &mut Criterion) {
    let points = random_points(20_000);

    c.bench_function("tetree sequential insert 20k", |b| {
        b.iter(|| {
            let index: Tetree<u32, ()> = Tetree::new(make_config());
            for (id, p) in points.iter().enumerate() {
                index.insert(id as u32, (), *p, LEVEL, None).unwrap();
            }
            black_box(index.entity_count());
        })
    });
}

fn benchmark_bulk_insert_lazy_keys(c: &mut Criterion) {
    let points = random_points(20_000);

    c.bench_function("tetree bulk insert 20k (cached keys)", |b| {
        b.iter(|| {
            let index: Tetree<u32, ()> = Tetree::new(make_config());
            let batch: Vec<BatchEntity<u32, ()>> = points
                .iter()
                .enumerate()
                .map(|(id, p)| BatchEntity::new(id as u32, (), *p, LEVEL, None))
                .collect();
            index.insert_batch(batch).unwrap();
            black_box(index.entity_count());
        })
    });
}

fn benchmark_k_nearest(c: &mut Criterion) {
    let points = random_points(20_000);
    let index: Tetree<u32, ()> = Tetree::new(make_config());
    for (id, p) in points.iter().enumerate() {
        index.insert(id as u32, (), *p, LEVEL, None).unwrap();
    }
    let query = Point3::new(1000.0, 1000.0, 1000.0);

    c.bench_function("tetree k_nearest k=10 over 20k", |b| {
        b.iter(|| {
            black_box(
                index
                    .k_nearest(black_box(query), 10, None, &NeverCancel)
                    .unwrap(),
            )
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(30).measurement_time(std::time::Duration::from_secs(10));
    targets = benchmark_enclosing,
              benchmark_sequential_insert,
              benchmark_bulk_insert_lazy_keys,
              benchmark_k_nearest,
}
criterion_main!(benches);
