use domain::errors::IndexError;
use domain::models::{EmbeddingVector, Neighbor};
use domain::ports::VectorIndex;
use rayon::prelude::*;

/// Above this many vectors the distance scan is spread over the rayon pool.
const PARALLEL_SCAN_THRESHOLD: usize = 4096;

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Exact nearest-neighbour search by linear scan. Fine for a corpus of a few
/// dozen questions; swap for an ANN structure behind `VectorIndex` if it grows.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<EmbeddingVector>,
}

impl FlatL2Index {
    pub fn build(vectors: Vec<EmbeddingVector>) -> Result<Self, IndexError> {
        let dimension = vectors.first().map(Vec::len).ok_or(IndexError::Empty)?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(Self { dimension, vectors })
    }

    fn distances(&self, query: &[f32]) -> Vec<Neighbor> {
        // NaN (e.g. inf - inf) ranks with the farthest entries.
        let score = |(position, vector): (usize, &EmbeddingVector)| {
            let distance = euclidean_distance(query, vector);
            Neighbor {
                position,
                distance: if distance.is_nan() { f32::INFINITY } else { distance },
            }
        };
        if self.vectors.len() >= PARALLEL_SCAN_THRESHOLD {
            self.vectors.par_iter().enumerate().map(score).collect()
        } else {
            self.vectors.iter().enumerate().map(score).collect()
        }
    }
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let mut neighbors = self.distances(query);
        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}
