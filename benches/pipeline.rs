use criterion::{black_box, criterion_group, criterion_main, Criterion};
use huddle::{ClusteringRequest, NamedEmbedding, Pipeline};
use rand::prelude::*;

fn make_request(n: usize, d: usize, seed: u64) -> ClusteringRequest {
    let mut rng = StdRng::seed_from_u64(seed);
    // A handful of loose centers so the density stage has real structure.
    let centers: Vec<Vec<f32>> = (0..8)
        .map(|_| (0..d).map(|_| rng.random::<f32>() * 20.0).collect())
        .collect();

    let embeddings = (0..n)
        .map(|i| {
            let center = &centers[i % centers.len()];
            let embedding = center
                .iter()
                .map(|c| c + rng.random::<f32>() * 0.5)
                .collect();
            NamedEmbedding {
                name: format!("item-{i}"),
                embedding,
            }
        })
        .collect();

    ClusteringRequest { embeddings }
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    let pipeline = Pipeline::default();
    let request = make_request(500, 16, 42);

    group.bench_function("cluster_n500_d16", |b| {
        b.iter(|| {
            pipeline.cluster(black_box(request.clone())).unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
