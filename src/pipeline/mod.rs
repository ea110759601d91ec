//! The clustering pipeline: density clustering, noise rescue, oversized
//! splits, and a final centroid merge.
//!
//! Stages run strictly in order over one owned label buffer; no stage reads
//! another stage's intermediate state concurrently and nothing survives a
//! call. The whole pipeline is synchronous CPU work and fully deterministic,
//! so there is nothing to retry and nothing to cancel mid-flight.
//!
//! ## Usage
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

mod merge;
mod rescue;
mod split;

use serde::{Deserialize, Serialize};

use crate::batch::{ClusterGroups, ClusteringRequest, EmbeddingBatch};
use crate::cluster::{DensityParams, Hdbscan, SelectionMethod};
use crate::error::{Error, Result};
use crate::metrics::Metric;

/// Every tunable of the pipeline. All of these are configuration surface;
/// none are hardcoded in the stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Density parameters for the primary pass over the whole batch.
    pub primary: DensityParams,
    /// Density parameters for re-clustering oversized clusters: same minimum
    /// size but tighter epsilon and stability-based selection, to surface
    /// finer sub-structure.
    pub split: DensityParams,
    /// Clusters larger than this are re-clustered by the split stage.
    pub max_cluster_size: usize,
    /// Clusters at or above this member count stop accepting rescued noise
    /// points.
    pub rescue_capacity: usize,
    /// Metric for noise-to-centroid rescue distances.
    pub rescue_metric: Metric,
    /// Clusters whose centroid distance is strictly below this merge into
    /// one.
    pub merge_threshold: f32,
    /// Metric for centroid-to-centroid merge distances.
    pub merge_metric: Metric,
    /// Hard bound on batch size; the pairwise matrices are O(n^2), so larger
    /// batches are rejected up front instead of failing under memory
    /// pressure.
    pub max_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary: DensityParams {
                min_cluster_size: 2,
                min_samples: 2,
                alpha: 0.93,
                cluster_selection_epsilon: 0.56,
                selection: SelectionMethod::Leaf,
                metric: Metric::Euclidean,
            },
            split: DensityParams {
                min_cluster_size: 2,
                min_samples: 2,
                alpha: 1.0,
                cluster_selection_epsilon: 0.28,
                selection: SelectionMethod::ExcessOfMass,
                metric: Metric::Euclidean,
            },
            max_cluster_size: 15,
            rescue_capacity: 15,
            rescue_metric: Metric::Cosine,
            merge_threshold: 0.5,
            merge_metric: Metric::Euclidean,
            max_batch_size: 4096,
        }
    }
}

/// The clustering pipeline. Stateless between runs; cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Build a pipeline from a configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The full request/response operation: validate, run all stages, group
    /// names by final label.
    pub fn cluster(&self, request: ClusteringRequest) -> Result<ClusterGroups> {
        let batch = EmbeddingBatch::try_from(request)?;
        let labels = self.run(&batch)?;
        Ok(ClusterGroups::from_labels(batch.names(), &labels))
    }

    /// Run the four stages over a validated batch and return the final label
    /// per point (`-1` for points that stayed noise).
    pub fn run(&self, batch: &EmbeddingBatch) -> Result<Vec<i64>> {
        let cfg = &self.config;
        if batch.len() > cfg.max_batch_size {
            return Err(Error::BatchTooLarge {
                size: batch.len(),
                max: cfg.max_batch_size,
            });
        }
        if !(cfg.merge_threshold >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "merge_threshold",
                message: "must be non-negative",
            });
        }

        let vectors = batch.vectors();

        let mut labels = Hdbscan::new(cfg.primary.clone()).fit_predict(vectors)?;
        rescue::rescue_noise(vectors, &mut labels, cfg.rescue_capacity, cfg.rescue_metric);
        split::split_oversized(vectors, &mut labels, &cfg.split, cfg.max_cluster_size)?;
        merge::merge_close(vectors, &mut labels, cfg.merge_threshold, cfg.merge_metric);

        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::NamedEmbedding;
    use crate::cluster::NOISE;

    fn request(points: &[(&str, Vec<f32>)]) -> ClusteringRequest {
        ClusteringRequest {
            embeddings: points
                .iter()
                .map(|(name, embedding)| NamedEmbedding {
                    name: (*name).to_owned(),
                    embedding: embedding.clone(),
                })
                .collect(),
        }
    }

    #[test]
    fn two_pairs_yield_two_groups() {
        let groups = Pipeline::default()
            .cluster(request(&[
                ("a", vec![0.0, 0.0]),
                ("b", vec![0.1, 0.1]),
                ("c", vec![5.0, 5.0]),
                ("d", vec![5.1, 5.1]),
            ]))
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert!(groups.noise().is_none());
        let mut sizes: Vec<usize> = groups.0.values().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 2]);

        // a/b together, c/d together.
        let of = |name: &str| {
            groups
                .0
                .iter()
                .find(|(_, members)| members.iter().any(|m| m == name))
                .map(|(label, _)| label.clone())
                .unwrap()
        };
        assert_eq!(of("a"), of("b"));
        assert_eq!(of("c"), of("d"));
        assert_ne!(of("a"), of("c"));
    }

    #[test]
    fn single_point_batch_is_one_noise_group() {
        let groups = Pipeline::default()
            .cluster(request(&[("only", vec![1.0, 2.0, 3.0])]))
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.noise(), Some(&["only".to_owned()][..]));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let result = Pipeline::default().cluster(request(&[]));
        assert!(matches!(result, Err(Error::EmptyBatch)));
    }

    #[test]
    fn ragged_batch_is_rejected_before_any_stage() {
        let result = Pipeline::default().cluster(request(&[
            ("a", vec![0.0, 0.0]),
            ("b", vec![0.0]),
        ]));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn oversized_batch_is_rejected() {
        let config = PipelineConfig {
            max_batch_size: 3,
            ..Default::default()
        };
        let result = Pipeline::new(config).cluster(request(&[
            ("a", vec![0.0]),
            ("b", vec![0.1]),
            ("c", vec![0.2]),
            ("d", vec![0.3]),
        ]));
        assert!(matches!(
            result,
            Err(Error::BatchTooLarge { size: 4, max: 3 })
        ));
    }

    #[test]
    fn every_name_appears_exactly_once() {
        let points: Vec<(String, Vec<f32>)> = (0..40)
            .map(|i| {
                let x = (i % 8) as f32 * 0.25;
                let y = (i / 8) as f32 * 6.0;
                (format!("p{i}"), vec![x, y])
            })
            .collect();
        let borrowed: Vec<(&str, Vec<f32>)> = points
            .iter()
            .map(|(n, v)| (n.as_str(), v.clone()))
            .collect();

        let groups = Pipeline::default().cluster(request(&borrowed)).unwrap();

        let mut seen: Vec<String> = groups.0.values().flatten().cloned().collect();
        seen.sort();
        let mut expected: Vec<String> = points.iter().map(|(n, _)| n.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn pipeline_is_deterministic() {
        let points: Vec<(String, Vec<f32>)> = (0..30)
            .map(|i| {
                let x = ((i * 7) % 13) as f32 * 0.3;
                let y = ((i * 11) % 5) as f32 * 4.0;
                (format!("p{i}"), vec![x, y])
            })
            .collect();
        let borrowed: Vec<(&str, Vec<f32>)> = points
            .iter()
            .map(|(n, v)| (n.as_str(), v.clone()))
            .collect();

        let pipeline = Pipeline::default();
        let first = pipeline.cluster(request(&borrowed)).unwrap();
        for _ in 0..3 {
            assert_eq!(pipeline.cluster(request(&borrowed)).unwrap(), first);
        }
    }

    #[test]
    fn merge_threshold_zero_keeps_clusters_apart() {
        let config = PipelineConfig {
            merge_threshold: 0.0,
            ..Default::default()
        };
        let groups = Pipeline::new(config)
            .cluster(request(&[
                ("a", vec![0.0, 0.0]),
                ("b", vec![0.1, 0.1]),
                ("c", vec![2.0, 2.0]),
                ("d", vec![2.1, 2.1]),
            ]))
            .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn negative_merge_threshold_is_rejected() {
        let config = PipelineConfig {
            merge_threshold: -1.0,
            ..Default::default()
        };
        let result = Pipeline::new(config).cluster(request(&[
            ("a", vec![0.0, 0.0]),
            ("b", vec![0.1, 0.1]),
        ]));
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"merge_threshold": 0.25}"#).unwrap();
        assert_eq!(config.merge_threshold, 0.25);
        assert_eq!(config.max_cluster_size, 15);
        assert_eq!(config.rescue_metric, Metric::Cosine);
    }
}
