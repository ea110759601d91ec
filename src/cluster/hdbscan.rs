//! HDBSCAN: Hierarchical Density-Based Spatial Clustering of Applications with Noise.
//!
//! HDBSCAN (Campello, Moulavi, Sander 2013) extends DBSCAN by removing the global
//! epsilon parameter and instead building a hierarchy of density-based clusters,
//! then extracting a flat labeling from it.
//!
//! # Algorithm Outline
//!
//! 1. **Core distance**: For each point, compute the distance to its
//!    `min_samples`-th nearest neighbor (the point itself counts). This
//!    estimates local density.
//!
//! 2. **Mutual reachability distance**: For each pair (i, j):
//!    `mrd(i, j) = max(core_dist[i], core_dist[j], dist(i, j) / alpha)`.
//!    This smooths out density spikes so sparse regions don't create spurious
//!    links; `alpha` scales how eagerly points connect.
//!
//! 3. **MST on mutual reachability graph**: Build a minimum spanning tree over the
//!    mutual reachability distances using Prim's algorithm (O(n^2)).
//!
//! 4. **Condensed cluster tree**: Walk MST edges in ascending distance order, merging
//!    components. When a merge produces a component below `min_cluster_size`, those
//!    points "fall out" as noise rather than forming a cluster split.
//!
//! 5. **Flat cluster extraction**: Either the leaf clusters of the condensed
//!    tree ([`SelectionMethod::Leaf`]) or the stability-maximizing antichain
//!    ([`SelectionMethod::ExcessOfMass`]), with `cluster_selection_epsilon`
//!    folding clusters born below that radius into a coarser ancestor.
//!
//! 6. **Noise labeling**: Points in no selected cluster get [`NOISE`] (`-1`).
//!
//! # Determinism
//!
//! There is no randomness anywhere: for a fixed input and parameter set the
//! label vector is identical run to run.
//!
//! # References
//!
//! Campello, R. J. G. B., Moulavi, D., Sander, J. (2013). "Density-Based Clustering
//! Based on Hierarchical Density Estimates." PAKDD 2013.

use serde::{Deserialize, Serialize};

use super::util::{self, UnionFind};
use crate::error::{Error, Result};
use crate::metrics::{self, Metric};

/// Reserved label for points too sparse to belong to any cluster.
pub const NOISE: i64 = -1;

/// How flat clusters are extracted from the condensed hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Report the tightest (leaf) clusters of the hierarchy.
    Leaf,
    /// Report the most stable clusters ("excess of mass").
    #[default]
    ExcessOfMass,
}

/// Parameters for one HDBSCAN pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityParams {
    /// Minimum member count for a cluster to persist in the hierarchy.
    pub min_cluster_size: usize,
    /// k for the core-distance computation (the point itself counts).
    pub min_samples: usize,
    /// Density sensitivity: pairwise distances are divided by `alpha` in the
    /// mutual reachability computation. Values below 1.0 cluster more
    /// conservatively.
    pub alpha: f32,
    /// Clusters born at a distance below this radius are merged into a
    /// coarser ancestor. 0.0 disables the merge.
    pub cluster_selection_epsilon: f32,
    /// Flat extraction strategy.
    pub selection: SelectionMethod,
    /// Metric for the underlying pairwise distances.
    pub metric: Metric,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            min_samples: 2,
            alpha: 1.0,
            cluster_selection_epsilon: 0.0,
            selection: SelectionMethod::ExcessOfMass,
            metric: Metric::Euclidean,
        }
    }
}

/// HDBSCAN clustering pass.
#[derive(Debug, Clone)]
pub struct Hdbscan {
    params: DensityParams,
}

impl Hdbscan {
    /// Create a clusterer from a parameter set.
    pub fn new(params: DensityParams) -> Self {
        Self { params }
    }

    /// Fit and return one label per input point, [`NOISE`] for outliers.
    pub fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<i64>> {
        let n = data.len();
        if n == 0 {
            return Err(Error::EmptyBatch);
        }

        let p = &self.params;
        if p.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        if p.min_cluster_size < 2 {
            return Err(Error::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 2",
            });
        }
        if !(p.alpha > 0.0) {
            return Err(Error::InvalidParameter {
                name: "alpha",
                message: "must be positive",
            });
        }
        if p.cluster_selection_epsilon < 0.0 {
            return Err(Error::InvalidParameter {
                name: "cluster_selection_epsilon",
                message: "must be non-negative",
            });
        }

        let d = data[0].len();
        if d == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }
        for point in data.iter().skip(1) {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
        }

        if n == 1 {
            return Ok(vec![NOISE]);
        }

        let dists = metrics::pairwise_symmetric(data, p.metric);
        let core_dists = core_distances(&dists, n, p.min_samples);

        let alpha = p.alpha;
        let mut mst = util::prim_mst(n, |i, j| {
            mutual_reachability(dists[i * n + j] / alpha, core_dists[i], core_dists[j])
        });
        mst.sort_by(|a, b| a.2.total_cmp(&b.2));

        Ok(extract_clusters(
            &mst,
            n,
            p.min_cluster_size,
            p.selection,
            p.cluster_selection_epsilon,
        ))
    }
}

/// Distance to the `min_samples`-th nearest neighbor, the point itself
/// included. `min_samples = 1` makes every point its own core (distance 0).
fn core_distances(dists: &[f32], n: usize, min_samples: usize) -> Vec<f32> {
    let k = min_samples.saturating_sub(1).min(n - 1);
    let mut core = Vec::with_capacity(n);
    for i in 0..n {
        if k == 0 {
            core.push(0.0);
            continue;
        }
        let mut row: Vec<f32> = (0..n)
            .filter(|&j| j != i)
            .map(|j| dists[i * n + j])
            .collect();
        row.sort_by(|a, b| a.total_cmp(b));
        core.push(row[k - 1]);
    }
    core
}

#[inline]
fn mutual_reachability(dist: f32, core_i: f32, core_j: f32) -> f32 {
    dist.max(core_i).max(core_j)
}

// ---------------------------------------------------------------------------
// Condensed cluster tree
// ---------------------------------------------------------------------------

/// An entry in the condensed cluster tree stored as a flat table.
///
/// Each row represents either:
/// - A point falling out of a cluster (child is a point index, child_size = 1)
/// - A cluster splitting into a child cluster (child is a cluster id, child_size > 1)
struct CondensedEdge {
    parent: usize, // cluster id
    child: usize,  // point index or cluster id
    lambda: f64,   // 1/distance at which this happened
    child_size: usize,
}

fn extract_clusters(
    mst: &[(usize, usize, f32)],
    n: usize,
    min_cluster_size: usize,
    selection: SelectionMethod,
    cluster_selection_epsilon: f32,
) -> Vec<i64> {
    // Cluster ids start at n (point ids are 0..n-1).
    let mut next_cluster_id = n;
    let mut uf = UnionFind::new(n);
    // UF root -> current cluster id (None if no cluster formed yet).
    let mut comp_cluster: Vec<Option<usize>> = vec![None; n];
    let mut condensed: Vec<CondensedEdge> = Vec::new();

    for &(u, v, dist) in mst {
        let ru = uf.find(u);
        let rv = uf.find(v);
        if ru == rv {
            continue;
        }

        let lambda = if dist > 0.0 {
            1.0 / dist as f64
        } else {
            f64::INFINITY
        };
        let ru_size = uf.size[ru];
        let rv_size = uf.size[rv];

        let left_big = ru_size >= min_cluster_size;
        let right_big = rv_size >= min_cluster_size;

        if left_big && right_big {
            // Genuine split: both sides are large. Create a new parent cluster.
            let new_cluster = next_cluster_id;
            next_cluster_id += 1;

            // Left child: if it has a cluster, use it; otherwise create one.
            let left_child = comp_cluster[ru].unwrap_or_else(|| {
                let id = next_cluster_id;
                next_cluster_id += 1;
                id
            });
            let right_child = comp_cluster[rv].unwrap_or_else(|| {
                let id = next_cluster_id;
                next_cluster_id += 1;
                id
            });

            condensed.push(CondensedEdge {
                parent: new_cluster,
                child: left_child,
                lambda,
                child_size: ru_size,
            });
            condensed.push(CondensedEdge {
                parent: new_cluster,
                child: right_child,
                lambda,
                child_size: rv_size,
            });

            // Also record individual point fallouts for the children if they
            // had no prior cluster (all their points are "born" into the child).
            if comp_cluster[ru].is_none() {
                add_point_fallouts(&mut condensed, &uf, ru, left_child, lambda, n);
            }
            if comp_cluster[rv].is_none() {
                add_point_fallouts(&mut condensed, &uf, rv, right_child, lambda, n);
            }

            let new_root = uf.union_roots(ru, rv);
            comp_cluster[new_root] = Some(new_cluster);
        } else if left_big || right_big {
            let (big, small) = if left_big { (ru, rv) } else { (rv, ru) };

            // Ensure big side has a cluster.
            let cluster = comp_cluster[big].unwrap_or_else(|| {
                let id = next_cluster_id;
                next_cluster_id += 1;
                // Record all existing big-component points as born into this cluster.
                add_point_fallouts(&mut condensed, &uf, big, id, lambda, n);
                id
            });

            // Small side's points fall out.
            add_point_fallouts(&mut condensed, &uf, small, cluster, lambda, n);

            let new_root = uf.union_roots(big, small);
            comp_cluster[new_root] = Some(cluster);
        } else {
            // Neither is large. Just merge; no cluster event.
            let existing = comp_cluster[ru].or(comp_cluster[rv]);
            let new_root = uf.union_roots(ru, rv);
            comp_cluster[new_root] = existing;
        }
    }

    let num_clusters = next_cluster_id - n;
    if num_clusters == 0 {
        return vec![NOISE; n];
    }

    // Compute lambda_birth and the parent link for each cluster.
    // A cluster is "born" when it first appears as a child in the condensed tree.
    // The root cluster (never appears as a child) is born at lambda=0.
    let mut lambda_birth = vec![0.0f64; num_clusters];
    let mut parent_of: Vec<Option<usize>> = vec![None; num_clusters];

    for edge in &condensed {
        if edge.child_size > 1 && edge.child >= n {
            let child_idx = edge.child - n;
            lambda_birth[child_idx] = edge.lambda;
            parent_of[child_idx] = Some(edge.parent - n);
        }
    }

    // Compute stability for each cluster.
    // stability(c) = sum over condensed edges with parent=c of
    //               child_size * (lambda - lambda_birth(c))
    let mut stability = vec![0.0f64; num_clusters];
    for edge in &condensed {
        if edge.parent < n {
            continue;
        }
        let cluster_idx = edge.parent - n;
        let birth = lambda_birth[cluster_idx];
        stability[cluster_idx] += edge.child_size as f64 * (edge.lambda - birth);
    }

    // Identify which clusters are leaves (no cluster children) and build the
    // children map.
    let mut has_cluster_child = vec![false; num_clusters];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); num_clusters];
    for edge in &condensed {
        if edge.parent < n || edge.child < n {
            continue;
        }
        if edge.child_size > 1 {
            let parent_idx = edge.parent - n;
            let child_idx = edge.child - n;
            has_cluster_child[parent_idx] = true;
            children[parent_idx].push(child_idx);
        }
    }

    let mut selected = vec![false; num_clusters];
    match selection {
        SelectionMethod::Leaf => {
            for i in 0..num_clusters {
                if !has_cluster_child[i] {
                    selected[i] = true;
                }
            }
        }
        SelectionMethod::ExcessOfMass => {
            // Bottom-up stability selection. A cluster child either existed
            // before its parent (lower id) or was created alongside it, in
            // which case it is a leaf whose initial subtree stability is
            // already final. Ascending id order therefore resolves every
            // non-leaf child before its parent. A leaf re-selected after an
            // ancestor won is dropped by the nesting pass below.
            let mut subtree_stab = stability.clone();
            for i in 0..num_clusters {
                if !has_cluster_child[i] {
                    selected[i] = true;
                } else {
                    let child_sum: f64 = children[i].iter().map(|&c| subtree_stab[c]).sum();
                    if stability[i] > child_sum {
                        selected[i] = true;
                        deselect_descendants(&children, i, &mut selected);
                        subtree_stab[i] = stability[i];
                    } else {
                        subtree_stab[i] = child_sum;
                    }
                }
            }
        }
    }

    // Epsilon merging: a selected cluster born at a distance below the
    // selection epsilon is replaced by its lowest ancestor born at or above
    // it (or the root).
    if cluster_selection_epsilon > 0.0 {
        let eps = cluster_selection_epsilon as f64;
        let birth_dist = |idx: usize| -> f64 {
            let l = lambda_birth[idx];
            if l > 0.0 {
                1.0 / l // lambda = inf (zero-distance birth) maps to 0.0
            } else {
                f64::INFINITY
            }
        };

        for i in 0..num_clusters {
            if !selected[i] || birth_dist(i) >= eps {
                continue;
            }
            let mut cur = i;
            while birth_dist(cur) < eps {
                match parent_of[cur] {
                    Some(p) => cur = p,
                    None => break,
                }
            }
            selected[i] = false;
            selected[cur] = true;
        }
    }

    // Drop any selected cluster nested under another selected cluster; its
    // points are labeled through the surviving ancestor.
    for i in 0..num_clusters {
        if !selected[i] {
            continue;
        }
        let mut cur = parent_of[i];
        while let Some(p) = cur {
            if selected[p] {
                selected[i] = false;
                break;
            }
            cur = parent_of[p];
        }
    }

    // Assign labels by walking selected clusters and labeling all their points
    // (direct fallouts + non-selected descendant subtrees).
    let mut labels = vec![NOISE; n];
    let mut label_map = vec![NOISE; num_clusters];
    let mut next_label: i64 = 0;
    for (i, &sel) in selected.iter().enumerate() {
        if sel {
            label_map[i] = next_label;
            next_label += 1;
        }
    }

    for i in 0..num_clusters {
        if !selected[i] {
            continue;
        }
        label_all_points(&condensed, &selected, n, i, label_map[i], &mut labels);
    }

    labels
}

/// Add individual point fallouts for all points in the component rooted at `comp_root`.
fn add_point_fallouts(
    condensed: &mut Vec<CondensedEdge>,
    uf: &UnionFind,
    comp_root: usize,
    parent_cluster: usize,
    lambda: f64,
    n: usize,
) {
    // UnionFind::find needs &mut self for path compression; walk the parent
    // array without compressing instead.
    for p in 0..n {
        if find_root_readonly(&uf.parent, p) == comp_root {
            condensed.push(CondensedEdge {
                parent: parent_cluster,
                child: p,
                lambda,
                child_size: 1,
            });
        }
    }
}

fn find_root_readonly(parent: &[usize], mut x: usize) -> usize {
    while parent[x] != x {
        x = parent[x];
    }
    x
}

/// Label all points belonging to cluster `cluster_idx` (and non-selected descendants).
fn label_all_points(
    condensed: &[CondensedEdge],
    selected: &[bool],
    n: usize,
    cluster_idx: usize,
    label: i64,
    labels: &mut [i64],
) {
    let cluster_id = cluster_idx + n;

    for edge in condensed {
        if edge.parent != cluster_id {
            continue;
        }
        if edge.child_size == 1 && edge.child < n {
            // Direct point fallout.
            labels[edge.child] = label;
        } else if edge.child_size > 1 && edge.child >= n {
            // Child cluster.
            let child_idx = edge.child - n;
            if selected[child_idx] {
                // Child is independently selected; don't override.
                continue;
            }
            // Recursively label all points in this non-selected child.
            label_all_points(condensed, selected, n, child_idx, label, labels);
        }
    }
}

fn deselect_descendants(children: &[Vec<usize>], node: usize, selected: &mut [bool]) {
    for &child in &children[node] {
        selected[child] = false;
        deselect_descendants(children, child, selected);
    }
}
