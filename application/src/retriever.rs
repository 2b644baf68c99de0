use domain::corpus::ExampleCorpus;
use domain::errors::PipelineError;
use domain::models::RetrievedExample;
use domain::ports::{Embedder, VectorIndex};
use infrastructure::embedder::CorpusEmbedder;
use infrastructure::embedding_storage::EmbeddingStorage;
use infrastructure::search::FlatL2Index;
use std::sync::Arc;
use tracing::debug;

/// Finds the corpus examples closest to a question. `index` entry `i` is the vector of `corpus[i]`.
pub struct Retriever<E, I = FlatL2Index> {
    corpus: Arc<ExampleCorpus>,
    index: I,
    embedder: E,
}

impl<E: Embedder> Retriever<E, FlatL2Index> {
    /// Embed every corpus question and build the flat index over them.
    pub async fn build(
        corpus: Arc<ExampleCorpus>,
        embedder: E,
        cache: Option<&EmbeddingStorage>,
    ) -> Result<Self, PipelineError> {
        let questions: Vec<&str> = corpus.questions().collect();
        let vectors = CorpusEmbedder::new(&embedder)
            .with_cache(cache)
            .embed_questions(&questions)
            .await?;
        let index = FlatL2Index::build(vectors)?;
        Self::new(corpus, index, embedder)
    }
}

impl<E: Embedder, I: VectorIndex> Retriever<E, I> {
    pub fn new(corpus: Arc<ExampleCorpus>, index: I, embedder: E) -> Result<Self, PipelineError> {
        if index.len() != corpus.len() {
            return Err(PipelineError::CorpusMismatch {
                examples: corpus.len(),
                vectors: index.len(),
            });
        }
        Ok(Self {
            corpus,
            index,
            embedder,
        })
    }

    pub fn corpus(&self) -> &ExampleCorpus {
        &self.corpus
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// The single nearest example.
    pub async fn retrieve(&self, question: &str) -> Result<RetrievedExample, PipelineError> {
        self.retrieve_top_k(question, 1)
            .await?
            .into_iter()
            .next()
            .ok_or(PipelineError::EmptyCorpus)
    }

    /// Up to `k` nearest examples, nearest first.
    pub async fn retrieve_top_k(
        &self,
        question: &str,
        k: usize,
    ) -> Result<Vec<RetrievedExample>, PipelineError> {
        let query = self.embedder.embed(question).await?;
        let neighbors = self.index.search(&query, k)?;
        let retrieved: Vec<RetrievedExample> = neighbors
            .into_iter()
            .filter_map(|n| {
                self.corpus.get(n.position).map(|example| RetrievedExample {
                    position: n.position,
                    question: example.question.clone(),
                    sql: example.sql.clone(),
                    distance: n.distance,
                })
            })
            .collect();
        if let Some(best) = retrieved.first() {
            debug!(
                position = best.position,
                distance = best.distance,
                "Closest example: {}",
                best.question
            );
        }
        Ok(retrieved)
    }
}
