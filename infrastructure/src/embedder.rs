use crate::embedding_storage::EmbeddingStorage;
use domain::errors::PipelineError;
use domain::models::EmbeddingVector;
use domain::ports::Embedder;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

const BATCH_SIZE: usize = 32;
const IN_FLIGHT: usize = 8;

/// Encodes corpus questions into vectors, in corpus order, reusing cached vectors when present.
pub struct CorpusEmbedder<'a, E> {
    embedder: &'a E,
    cache: Option<&'a EmbeddingStorage>,
}

impl<'a, E: Embedder> CorpusEmbedder<'a, E> {
    pub fn new(embedder: &'a E) -> Self {
        Self {
            embedder,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Option<&'a EmbeddingStorage>) -> Self {
        self.cache = cache;
        self
    }

    pub async fn embed_questions(
        &self,
        questions: &[&str],
    ) -> Result<Vec<EmbeddingVector>, PipelineError> {
        let model = self.embedder.model();
        let mut slots: Vec<Option<EmbeddingVector>> = questions
            .iter()
            .map(|question| self.cached(model, question))
            .collect();

        let missing: Vec<usize> = (0..questions.len())
            .filter(|&i| slots[i].is_none())
            .collect();
        info!(
            total = questions.len(),
            cached = questions.len() - missing.len(),
            model,
            "Embedding example corpus"
        );

        for chunk in missing.chunks(BATCH_SIZE) {
            debug!("Generating embeddings for {} questions...", chunk.len());
            let fresh: Vec<(usize, EmbeddingVector)> = stream::iter(chunk.iter().copied())
                .map(|i| async move {
                    self.embedder
                        .embed(questions[i])
                        .await
                        .map(|vector| (i, vector))
                })
                .buffered(IN_FLIGHT)
                .try_collect()
                .await?;

            self.store(model, questions, &fresh);
            for (i, vector) in fresh {
                slots[i] = Some(vector);
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn cached(&self, model: &str, question: &str) -> Option<EmbeddingVector> {
        let cache = self.cache?;
        match cache.get_embedding(model, question) {
            Ok(found) => found,
            Err(e) => {
                warn!("Embedding cache lookup failed: {e:#}");
                None
            }
        }
    }

    fn store(&self, model: &str, questions: &[&str], fresh: &[(usize, EmbeddingVector)]) {
        let Some(cache) = self.cache else {
            return;
        };
        let entries: Vec<(&str, &[f32])> = fresh
            .iter()
            .map(|(i, vector)| (questions[*i], vector.as_slice()))
            .collect();
        if let Err(e) = cache.insert_embeddings(model, &entries) {
            warn!("Failed to store corpus embeddings: {e:#}");
        }
    }
}
