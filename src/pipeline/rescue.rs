//! Noise rescue: assign unclustered points to the nearest existing cluster
//! centroid, capacity permitting.

use std::collections::BTreeMap;

use crate::cluster::NOISE;
use crate::metrics::{self, Metric};

/// Attempt to absorb every noise point into the closest cluster whose member
/// count is below `capacity`.
///
/// Centroids are computed once from the pre-rescue labeling; rescues never
/// cascade within a pass. Member counts are live, so a cluster stops
/// accepting points once it reaches capacity. Clusters are scanned in
/// ascending label order and a tie on distance keeps the first one seen,
/// which makes the pass deterministic.
pub(crate) fn rescue_noise(
    vectors: &[Vec<f32>],
    labels: &mut [i64],
    capacity: usize,
    metric: Metric,
) {
    // BTreeMap gives the ascending-label iteration order the tie-break relies on.
    let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE {
            members.entry(label).or_default().push(i);
        }
    }
    if members.is_empty() {
        return;
    }

    let clusters: Vec<(i64, Vec<f32>)> = members
        .iter()
        .map(|(&label, indices)| {
            let points: Vec<&[f32]> = indices.iter().map(|&i| vectors[i].as_slice()).collect();
            (label, metrics::centroid(&points))
        })
        .collect();
    let mut counts: Vec<usize> = members.values().map(Vec::len).collect();

    for i in 0..labels.len() {
        if labels[i] != NOISE {
            continue;
        }

        let mut best: Option<(usize, f32)> = None;
        for (ci, (_, centroid)) in clusters.iter().enumerate() {
            if counts[ci] >= capacity {
                continue;
            }
            let d = metrics::distance(&vectors[i], centroid, metric);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((ci, d));
            }
        }

        if let Some((ci, _)) = best {
            labels[i] = clusters[ci].0;
            counts[ci] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_joins_nearest_cluster() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 1.0],
            vec![0.9, 0.05], // noise, pointing the same way as cluster 0
        ];
        let mut labels = vec![0, 0, 1, 1, NOISE];

        rescue_noise(&vectors, &mut labels, 15, Metric::Cosine);
        assert_eq!(labels[4], 0);
    }

    #[test]
    fn full_cluster_rejects_rescue() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.1],
            vec![1.0, -0.1],
            vec![0.0, 1.0],
            vec![0.1, 1.0],
            vec![0.9, 0.05],
        ];
        let mut labels = vec![0, 0, 0, 1, 1, NOISE];

        // Capacity 3: cluster 0 is already full, so the point lands in
        // cluster 1 despite the larger distance.
        rescue_noise(&vectors, &mut labels, 3, Metric::Cosine);
        assert_eq!(labels[5], 1);
    }

    #[test]
    fn all_clusters_full_leaves_noise() {
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 0.1], vec![0.9, 0.05]];
        let mut labels = vec![0, 0, NOISE];

        rescue_noise(&vectors, &mut labels, 2, Metric::Cosine);
        assert_eq!(labels[2], NOISE);
    }

    #[test]
    fn no_clusters_is_a_noop() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let mut labels = vec![NOISE, NOISE];

        rescue_noise(&vectors, &mut labels, 15, Metric::Cosine);
        assert_eq!(labels, vec![NOISE, NOISE]);
    }

    #[test]
    fn capacity_fills_in_input_order() {
        // Three noise points, one slot available: only the first gets in.
        let vectors = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.1],
            vec![0.95, 0.0],
            vec![0.96, 0.0],
            vec![0.97, 0.0],
        ];
        let mut labels = vec![0, 0, NOISE, NOISE, NOISE];

        rescue_noise(&vectors, &mut labels, 3, Metric::Cosine);
        assert_eq!(labels[2], 0);
        assert_eq!(labels[3], NOISE);
        assert_eq!(labels[4], NOISE);
    }

    #[test]
    fn centroids_are_not_recomputed_mid_pass() {
        // Point 2 is rescued into cluster 0. If the centroid cascaded, it
        // would drag toward point 2 and capture point 3 as well; the fixed
        // pre-rescue centroid leaves point 3 closer to cluster 1.
        let vectors = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.0],
            vec![1.0, 0.0],
            vec![2.2, 0.0],
            vec![4.0, 0.0],
            vec![4.2, 0.0],
        ];
        let mut labels = vec![0, 0, NOISE, NOISE, 1, 1];

        rescue_noise(&vectors, &mut labels, 15, Metric::Euclidean);
        assert_eq!(labels[2], 0);
        assert_eq!(labels[3], 1);
    }
}
