//! Distance and centroid utilities shared by every pipeline stage.
//!
//! All functions here are pure: they take slices, return owned values, and
//! keep no state. Distance matrices are flat row-major `Vec<f32>` buffers,
//! indexed as `m[i * cols + j]`.

use serde::{Deserialize, Serialize};

/// Distance metric used for pairwise comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine distance: `1 - cos(a, b)`, range `[0, 2]`.
    Cosine,
    /// Euclidean (L2) distance.
    #[default]
    Euclidean,
}

/// Distance between two vectors under the given metric.
#[inline]
pub fn distance(a: &[f32], b: &[f32], metric: Metric) -> f32 {
    match metric {
        Metric::Cosine => cosine_distance(a, b),
        Metric::Euclidean => squared_euclidean(a, b).sqrt(),
    }
}

#[inline]
pub(crate) fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Cosine distance `1 - cos(a, b)`.
///
/// A zero-norm vector has no direction; it is treated as maximally distant
/// (distance 1.0) from any non-zero vector and identical to another zero
/// vector.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= f32::EPSILON && norm_b <= f32::EPSILON {
        return 0.0;
    }
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 1.0;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Elementwise mean of a non-empty set of equal-length vectors.
pub fn centroid(points: &[&[f32]]) -> Vec<f32> {
    debug_assert!(!points.is_empty(), "centroid of an empty set is undefined");
    let dim = points[0].len();
    let mut mean = vec![0.0f32; dim];
    for p in points {
        debug_assert_eq!(p.len(), dim);
        for (m, x) in mean.iter_mut().zip(p.iter()) {
            *m += x;
        }
    }
    let inv = 1.0 / points.len() as f32;
    for m in &mut mean {
        *m *= inv;
    }
    mean
}

/// Full pairwise distance matrix between `rows_a` and `rows_b`.
///
/// Returns a flat row-major matrix of shape `rows_a.len() x rows_b.len()`.
pub fn pairwise(rows_a: &[Vec<f32>], rows_b: &[Vec<f32>], metric: Metric) -> Vec<f32> {
    let cols = rows_b.len();
    let mut out = vec![0.0f32; rows_a.len() * cols];
    for (i, a) in rows_a.iter().enumerate() {
        for (j, b) in rows_b.iter().enumerate() {
            out[i * cols + j] = distance(a, b, metric);
        }
    }
    out
}

/// Symmetric pairwise distance matrix over one set of points.
///
/// Exploits symmetry: each pair is computed once and mirrored.
pub fn pairwise_symmetric(points: &[Vec<f32>], metric: Metric) -> Vec<f32> {
    let n = points.len();
    let mut out = vec![0.0f32; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distance(&points[i], &points[j], metric);
            out[i * n + j] = d;
            out[j * n + i] = d;
        }
    }
    out
}
