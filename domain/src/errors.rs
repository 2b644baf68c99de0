use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EmbeddingError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ExecutionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("vector index needs at least one vector")]
    Empty,
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Every way answering a question can fail. Each capability error maps onto exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("no question provided")]
    EmptyQuestion,
    #[error("example corpus is empty")]
    EmptyCorpus,
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("index holds {vectors} vectors for {examples} examples")]
    CorpusMismatch { examples: usize, vectors: usize },
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),
    #[error("generation quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("generation failed: {0}")]
    GenerationFailure(String),
    #[error("query execution failed: {0}")]
    ExecutionFailure(String),
}

impl PipelineError {
    /// Stable tag for the error kind, used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::EmptyQuestion => "empty_question",
            PipelineError::EmptyCorpus => "empty_corpus",
            PipelineError::DimensionMismatch { .. } => "dimension_mismatch",
            PipelineError::CorpusMismatch { .. } => "corpus_mismatch",
            PipelineError::EmbeddingFailure(_) => "embedding_failure",
            PipelineError::QuotaExceeded(_) => "quota_exceeded",
            PipelineError::GenerationFailure(_) => "generation_failure",
            PipelineError::ExecutionFailure(_) => "execution_failure",
        }
    }

    /// Text safe to hand back to the caller. Generation and internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::EmptyQuestion => "No question provided".to_string(),
            PipelineError::QuotaExceeded(_) => {
                "Generation quota exceeded. Please try again later.".to_string()
            }
            PipelineError::GenerationFailure(_) => {
                "Unexpected error while generating SQL query.".to_string()
            }
            PipelineError::EmbeddingFailure(_) => {
                "Embedding service unavailable. Please try again later.".to_string()
            }
            PipelineError::ExecutionFailure(message) => message.clone(),
            PipelineError::EmptyCorpus
            | PipelineError::DimensionMismatch { .. }
            | PipelineError::CorpusMismatch { .. } => "Internal error".to_string(),
        }
    }
}

impl From<EmbeddingError> for PipelineError {
    fn from(err: EmbeddingError) -> Self {
        PipelineError::EmbeddingFailure(err.0)
    }
}

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::QuotaExceeded(detail) => PipelineError::QuotaExceeded(detail),
            GenerationError::Failed(detail) => PipelineError::GenerationFailure(detail),
        }
    }
}

impl From<ExecutionError> for PipelineError {
    fn from(err: ExecutionError) -> Self {
        PipelineError::ExecutionFailure(err.0)
    }
}

impl From<IndexError> for PipelineError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Empty => PipelineError::EmptyCorpus,
            IndexError::DimensionMismatch { expected, actual } => {
                PipelineError::DimensionMismatch { expected, actual }
            }
        }
    }
}
