//! Oversized-cluster split: re-cluster any cluster above the size bound with
//! a second, more permissive density pass.

use std::collections::BTreeMap;

use crate::cluster::{DensityParams, Hdbscan, NOISE};
use crate::error::Result;

/// Re-run density clustering over every cluster whose member count exceeds
/// `max_size`, splicing the sub-labels back under fresh global labels.
///
/// The set of clusters to split is fixed at entry; newly created sub-clusters
/// are never re-examined (one level of recursion, guaranteed termination).
/// Each splice offsets sub-labels by `max(current labels) + 1`, computed once
/// per split, so global labels never collide. Points the sub-clustering
/// judges as noise keep [`NOISE`].
pub(crate) fn split_oversized(
    vectors: &[Vec<f32>],
    labels: &mut [i64],
    params: &DensityParams,
    max_size: usize,
) -> Result<()> {
    let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE {
            members.entry(label).or_default().push(i);
        }
    }

    let oversized: Vec<Vec<usize>> = members
        .into_values()
        .filter(|indices| indices.len() > max_size)
        .collect();

    let clusterer = Hdbscan::new(params.clone());
    for indices in oversized {
        let subset: Vec<Vec<f32>> = indices.iter().map(|&i| vectors[i].clone()).collect();
        let sub_labels = clusterer.fit_predict(&subset)?;

        let offset = next_free_label(labels);
        for (&i, &sub) in indices.iter().zip(sub_labels.iter()) {
            labels[i] = if sub == NOISE { NOISE } else { offset + sub };
        }
    }

    Ok(())
}

/// Smallest label strictly greater than every label currently in use.
fn next_free_label(labels: &[i64]) -> i64 {
    labels.iter().copied().max().unwrap_or(NOISE) + 1
}
