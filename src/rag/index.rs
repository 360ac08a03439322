//! Exact nearest-neighbour index over the store vectors.
//!
//! The index is rebuilt from the embedding store on every start and never
//! persisted. Each query scans all `n` rows, which is fine at the corpus
//! sizes this tool works with (tens of thousands of chunks).

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::store::Chunk;
use crate::core::errors::{GenerationError, SetupError};
use crate::vector_math::{normalize_in_place, normalized, squared_l2_distance};

/// Comparison metric used when ranking chunks against a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Squared euclidean distance, smaller is better.
    L2,
    /// Inner product of L2-normalised vectors, larger is better.
    Cosine,
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "l2" => Ok(Metric::L2),
            "cosine" | "ip" => Ok(Metric::Cosine),
            other => Err(format!("unknown metric '{}'; use l2 or cosine", other)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::L2 => f.write_str("l2"),
            Metric::Cosine => f.write_str("cosine"),
        }
    }
}

/// One search result: the chunk's position in the store and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
}

pub struct VectorIndex {
    metric: Metric,
    vectors: Array2<f32>,
}

impl VectorIndex {
    pub fn build(chunks: &[Chunk], metric: Metric) -> Result<Self, SetupError> {
        let dimension = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        let mut flat = Vec::with_capacity(chunks.len() * dimension);
        for chunk in chunks {
            flat.extend_from_slice(&chunk.embedding);
        }

        let mut vectors = Array2::from_shape_vec((chunks.len(), dimension), flat)
            .map_err(|err| SetupError::InvalidStore(err.to_string()))?;

        if metric == Metric::Cosine {
            for row in vectors.axis_iter_mut(Axis(0)) {
                normalize_in_place(row);
            }
        }

        tracing::info!(
            "Built {} index with {} vectors (dimension {})",
            metric,
            chunks.len(),
            dimension
        );
        Ok(Self { metric, vectors })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Returns up to `k` hits, best first. Equal scores keep store order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, GenerationError> {
        if query.len() != self.dimension() {
            return Err(GenerationError::Search(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dimension()
            )));
        }

        let mut hits: Vec<SearchHit> = match self.metric {
            Metric::L2 => {
                let query = ArrayView1::from(query);
                self.vectors
                    .axis_iter(Axis(0))
                    .enumerate()
                    .map(|(position, row)| SearchHit {
                        position,
                        score: squared_l2_distance(row, query),
                    })
                    .collect()
            }
            Metric::Cosine => {
                let query = normalized(query);
                self.vectors
                    .dot(&query)
                    .iter()
                    .enumerate()
                    .map(|(position, score)| SearchHit {
                        position,
                        score: *score,
                    })
                    .collect()
            }
        };

        // sort_by is stable, so ties stay in store order
        match self.metric {
            Metric::L2 => hits.sort_by(|a, b| a.score.total_cmp(&b.score)),
            Metric::Cosine => hits.sort_by(|a, b| b.score.total_cmp(&a.score)),
        }
        hits.truncate(k);
        Ok(hits)
    }
}
