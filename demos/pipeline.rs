//! The full pipeline on a simple 2D dataset.

use huddle::{ClusteringRequest, NamedEmbedding, Pipeline};

fn main() {
    // Three tight groups plus an outlier between them.
    let named: Vec<(&str, Vec<f32>)> = vec![
        ("alpha-1", vec![0.0, 0.0]),
        ("alpha-2", vec![0.1, 0.2]),
        ("alpha-3", vec![0.2, 0.1]),
        ("beta-1", vec![5.0, 5.0]),
        ("beta-2", vec![5.1, 4.9]),
        ("beta-3", vec![4.9, 5.1]),
        ("gamma-1", vec![10.0, 0.0]),
        ("gamma-2", vec![10.1, 0.1]),
        ("gamma-3", vec![9.9, -0.1]),
        ("stray", vec![30.0, 30.0]),
    ];

    let request = ClusteringRequest {
        embeddings: named
            .into_iter()
            .map(|(name, embedding)| NamedEmbedding {
                name: name.to_owned(),
                embedding,
            })
            .collect(),
    };

    let groups = Pipeline::default().cluster(request).unwrap();

    println!("=== cluster groups ===");
    for (label, members) in &groups.0 {
        let tag = if label == "-1" { " (noise)" } else { "" };
        println!("  {label}{tag}: {members:?}");
    }
}
