//! Capabilities the pipeline consumes. Implementations live in `infrastructure`;
//! tests substitute deterministic stubs.

use std::future::Future;

use crate::errors::{EmbeddingError, ExecutionError, GenerationError, IndexError};
use crate::models::{EmbeddingVector, Neighbor, Row};
use crate::prompt::Prompt;

pub trait Embedder: Send + Sync {
    /// Identifies the embedding model; vectors from different models are never mixed.
    fn model(&self) -> &str;

    fn embed(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<EmbeddingVector, EmbeddingError>> + Send;
}

pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &Prompt)
        -> impl Future<Output = Result<String, GenerationError>> + Send;
}

pub trait Executor: Send + Sync {
    fn execute(&self, sql: &str) -> impl Future<Output = Result<Vec<Row>, ExecutionError>> + Send;
}

/// Nearest-neighbour lookup over vectors aligned 1:1 with the example corpus.
///
/// Results are ascending by distance; equal distances are ordered by position.
/// `k == 0` yields nothing and `k` larger than the index yields every entry.
pub trait VectorIndex: Send + Sync {
    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError>;
}
