//! Clustering pipeline for named embedding vectors.
//!
//! `huddle` groups a batch of (name, embedding) pairs into clusters of
//! semantically related items. The heavy lifting is a four-stage pipeline:
//!
//! 1. **Density clustering** ([`cluster::Hdbscan`]): an HDBSCAN pass labels
//!    each point with a cluster id or [`cluster::NOISE`] (`-1`).
//! 2. **Noise rescue**: noise points join the cosine-nearest cluster
//!    centroid, as long as that cluster is under its capacity bound.
//! 3. **Oversized split**: clusters above the size bound are re-clustered
//!    with a more permissive parameter set; sub-labels are offset to stay
//!    globally unique.
//! 4. **Centroid merge**: clusters whose centroids sit closer than a
//!    threshold collapse into one, resolved through a disjoint-set so
//!    chained merges are transitive.
//!
//! The response maps each cluster label (stringified, `"-1"` included) to
//! its member names; every input name appears in exactly one group.
//!
//! ```rust
//! use huddle::{ClusteringRequest, NamedEmbedding, Pipeline};
//!
//! let request = ClusteringRequest {
//!     embeddings: vec![
//!         NamedEmbedding { name: "a".into(), embedding: vec![0.0, 0.0] },
//!         NamedEmbedding { name: "b".into(), embedding: vec![0.1, 0.1] },
//!         NamedEmbedding { name: "c".into(), embedding: vec![5.0, 5.0] },
//!         NamedEmbedding { name: "d".into(), embedding: vec![5.1, 5.1] },
//!     ],
//! };
//!
//! let groups = Pipeline::default().cluster(request).unwrap();
//! assert_eq!(groups.len(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod batch;
pub mod cluster;
pub mod error;
pub mod metrics;
pub mod pipeline;

pub use batch::{ClusterGroups, ClusteringRequest, EmbeddingBatch, NamedEmbedding};
pub use cluster::{DensityParams, Hdbscan, SelectionMethod, NOISE};
pub use error::{Error, Result};
pub use metrics::Metric;
pub use pipeline::{Pipeline, PipelineConfig};
