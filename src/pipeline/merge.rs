//! Centroid merge: collapse clusters whose centroids sit closer than the
//! merge threshold.

use std::collections::BTreeMap;

use crate::cluster::util::UnionFind;
use crate::cluster::NOISE;
use crate::metrics::{self, Metric};

/// Merge every pair of clusters whose centroid distance is strictly below
/// `threshold`.
///
/// Close pairs are unioned in a disjoint-set structure and every label
/// resolves to the smallest label of its set, so chained merges (A close to
/// B, B close to C) land all three in one cluster regardless of the order
/// pairs were examined. A threshold of zero merges nothing.
pub(crate) fn merge_close(
    vectors: &[Vec<f32>],
    labels: &mut [i64],
    threshold: f32,
    metric: Metric,
) {
    let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE {
            members.entry(label).or_default().push(i);
        }
    }
    if members.len() < 2 {
        return;
    }

    // Ascending label order; index in these arrays is the union-find id.
    let cluster_labels: Vec<i64> = members.keys().copied().collect();
    let centroids: Vec<Vec<f32>> = members
        .values()
        .map(|indices| {
            let points: Vec<&[f32]> = indices.iter().map(|&i| vectors[i].as_slice()).collect();
            metrics::centroid(&points)
        })
        .collect();

    let k = cluster_labels.len();
    let dists = metrics::pairwise_symmetric(&centroids, metric);

    let mut uf = UnionFind::new(k);
    for i in 0..k {
        for j in (i + 1)..k {
            if dists[i * k + j] < threshold {
                uf.union(i, j);
            }
        }
    }

    // Canonical label per set: the smallest, which is the first seen when
    // scanning in ascending label order.
    let mut canonical: BTreeMap<usize, i64> = BTreeMap::new();
    let mut remap: BTreeMap<i64, i64> = BTreeMap::new();
    for (ci, &label) in cluster_labels.iter().enumerate() {
        let root = uf.find(ci);
        let target = *canonical.entry(root).or_insert(label);
        remap.insert(label, target);
    }

    for label in labels.iter_mut() {
        if *label != NOISE {
            *label = remap[label];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_centroids_merge() {
        let vectors = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.0],
            vec![0.3, 0.0],
            vec![0.5, 0.0],
            vec![10.0, 0.0],
        ];
        let mut labels = vec![0, 0, 1, 1, 2];

        // Centroids at 0.1 and 0.4: distance 0.3 < 0.5 merges them; the far
        // cluster stays.
        merge_close(&vectors, &mut labels, 0.5, Metric::Euclidean);
        assert_eq!(labels, vec![0, 0, 0, 0, 2]);
    }

    #[test]
    fn zero_threshold_never_merges() {
        // Identical centroids, zero distance: strict comparison keeps them
        // apart.
        let vectors = vec![
            vec![0.0, 0.0],
            vec![2.0, 0.0],
            vec![1.0, 1.0],
            vec![1.0, -1.0],
        ];
        let mut labels = vec![0, 0, 1, 1];
        let before = labels.clone();

        merge_close(&vectors, &mut labels, 0.0, Metric::Euclidean);
        assert_eq!(labels, before);
    }

    #[test]
    fn chained_merges_are_transitive() {
        // Centroids at 0.0, 0.4, 0.8: only adjacent pairs are below the
        // threshold, yet all three must end up together.
        let vectors = vec![
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![0.4, 0.0],
            vec![0.4, 0.0],
            vec![0.8, 0.0],
            vec![0.8, 0.0],
        ];
        let mut labels = vec![0, 0, 1, 1, 2, 2];

        merge_close(&vectors, &mut labels, 0.5, Metric::Euclidean);
        assert_eq!(labels, vec![0; 6]);
    }

    #[test]
    fn noise_is_ignored() {
        let vectors = vec![vec![0.0, 0.0], vec![0.1, 0.0], vec![100.0, 0.0]];
        let mut labels = vec![0, 1, NOISE];

        merge_close(&vectors, &mut labels, 0.5, Metric::Euclidean);
        assert_eq!(labels, vec![0, 0, NOISE]);
    }

    #[test]
    fn single_cluster_is_a_noop() {
        let vectors = vec![vec![0.0, 0.0], vec![0.1, 0.0]];
        let mut labels = vec![0, 0];

        merge_close(&vectors, &mut labels, 0.5, Metric::Euclidean);
        assert_eq!(labels, vec![0, 0]);
    }
}
