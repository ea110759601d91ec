//! Boundary types: the wire request, the validated batch, and the grouped
//! response.
//!
//! The wire format matches the existing clustering endpoint: a request is
//! `{"embeddings": [{"name": ..., "embedding": [...]}, ...]}` and the
//! response is an object keyed by stringified cluster label (`"-1"` for
//! unclustered items) with the member names as values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cluster::NOISE;
use crate::error::{Error, Result};

/// One named embedding vector from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEmbedding {
    /// Display name; unique within a batch in practice but not enforced.
    pub name: String,
    /// Dense embedding vector.
    pub embedding: Vec<f32>,
}

/// Request body for a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringRequest {
    /// The batch of embeddings to group.
    pub embeddings: Vec<NamedEmbedding>,
}

/// A validated batch: at least one entry, every name non-empty, every vector
/// the same non-zero dimension.
///
/// Names and vectors are split into parallel arrays; index `i` refers to the
/// same point everywhere in the pipeline.
#[derive(Debug, Clone)]
pub struct EmbeddingBatch {
    names: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dim: usize,
}

impl EmbeddingBatch {
    /// Validate a request batch. No clustering work happens until this
    /// succeeds; a failure leaves no partial state anywhere.
    pub fn new(entries: Vec<NamedEmbedding>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let dim = entries[0].embedding.len();
        if dim == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }

        let mut names = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if entry.name.is_empty() {
                return Err(Error::EmptyName { index });
            }
            if entry.embedding.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    found: entry.embedding.len(),
                });
            }
            names.push(entry.name);
            vectors.push(entry.embedding);
        }

        Ok(Self { names, vectors, dim })
    }

    /// Number of points in the batch (always at least 1).
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True only for the unreachable empty case; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Shared dimensionality of all vectors.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Point names, in input order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Embedding vectors, in input order.
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}

impl TryFrom<ClusteringRequest> for EmbeddingBatch {
    type Error = Error;

    fn try_from(request: ClusteringRequest) -> Result<Self> {
        Self::new(request.embeddings)
    }
}

/// Response body: stringified cluster label -> member names.
///
/// Member lists keep discovery (input) order. Unrescued noise points appear
/// under the `"-1"` key rather than being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterGroups(pub BTreeMap<String, Vec<String>>);

impl ClusterGroups {
    /// Group names by their final labels. `names` and `labels` are the
    /// parallel arrays produced by the pipeline.
    pub fn from_labels(names: &[String], labels: &[i64]) -> Self {
        debug_assert_eq!(names.len(), labels.len());
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, &label) in names.iter().zip(labels.iter()) {
            groups
                .entry(label.to_string())
                .or_default()
                .push(name.clone());
        }
        Self(groups)
    }

    /// Members of the noise group, if any point remained unclustered.
    pub fn noise(&self) -> Option<&[String]> {
        self.0.get(&NOISE.to_string()).map(Vec::as_slice)
    }

    /// Number of groups, the noise group included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no groups exist (never the case for a valid batch).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
