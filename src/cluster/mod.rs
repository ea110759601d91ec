//! Density-based clustering for dense vectors.
//!
//! The only algorithm here is HDBSCAN; the pipeline runs it twice (a primary
//! pass over the whole batch and a more permissive pass over oversized
//! clusters), so the parameters live in their own value type,
//! [`DensityParams`].
//!
//! Labels are `i64` where [`NOISE`] (`-1`) marks points the algorithm judged
//! too sparse to belong to any cluster.
//!
//! ## Usage
//!
//! ```rust
//! use huddle::cluster::{DensityParams, Hdbscan, SelectionMethod, NOISE};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let params = DensityParams {
//!     min_cluster_size: 2,
//!     min_samples: 2,
//!     selection: SelectionMethod::Leaf,
//!     ..Default::default()
//! };
//! let labels = Hdbscan::new(params).fit_predict(&data).unwrap();
//!
//! assert_eq!(labels[0], labels[1]); // First two together
//! assert_ne!(labels[0], labels[2]); // Separate from last two
//! assert!(labels.iter().all(|&l| l != NOISE));
//! ```

mod hdbscan;
pub(crate) mod util;

pub use hdbscan::{DensityParams, Hdbscan, SelectionMethod, NOISE};
