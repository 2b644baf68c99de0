use crate::retriever::Retriever;
use domain::corpus::ExampleCorpus;
use domain::errors::PipelineError;
use domain::models::{Example, QueryAnswer, RetrievedExample};
use domain::ports::{Embedder, Executor, Generator, VectorIndex};
use domain::prompt::{Prompt, PromptAssembler};
use domain::sanitizer::sanitize_sql;
use infrastructure::search::FlatL2Index;
use shared::telemetry::Telemetry;
use shared::utils::preview;
use tracing::{debug, info};

/// Which examples ground the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStrategy {
    /// Whole corpus in corpus order. Retrieval still runs and is reported, but does not shape the prompt.
    FullCorpus,
    /// Only the `k` nearest examples, nearest first.
    Retrieved { k: usize },
}

/// A prompt ready for the generator plus the retrieval that accompanied it.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub prompt: Prompt,
    pub closest_example: RetrievedExample,
}

/// question -> retrieval -> prompt -> generation -> sanitize -> execution.
pub struct SqlService<E, G, X, I = FlatL2Index> {
    retriever: Retriever<E, I>,
    assembler: PromptAssembler,
    generator: G,
    executor: X,
    strategy: PromptStrategy,
}

impl<E, G, X, I> SqlService<E, G, X, I>
where
    E: Embedder,
    G: Generator,
    X: Executor,
    I: VectorIndex,
{
    pub fn new(
        retriever: Retriever<E, I>,
        assembler: PromptAssembler,
        generator: G,
        executor: X,
        strategy: PromptStrategy,
    ) -> Self {
        Self {
            retriever,
            assembler,
            generator,
            executor,
            strategy,
        }
    }

    pub fn corpus(&self) -> &ExampleCorpus {
        self.retriever.corpus()
    }

    pub fn dimension(&self) -> usize {
        self.retriever.index().dimension()
    }

    pub fn strategy(&self) -> PromptStrategy {
        self.strategy
    }

    pub async fn prepare(&self, question: &str) -> Result<PreparedPrompt, PipelineError> {
        if question.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        let (prompt, closest) = match self.strategy {
            PromptStrategy::FullCorpus => {
                let closest = self.retriever.retrieve(question).await?;
                let prompt = self.assembler.assemble(self.corpus().examples(), question);
                (prompt, closest)
            }
            PromptStrategy::Retrieved { k } => {
                let hits = self.retriever.retrieve_top_k(question, k.max(1)).await?;
                let examples: Vec<Example> = hits
                    .iter()
                    .map(|h| Example::new(h.question.as_str(), h.sql.as_str()))
                    .collect();
                let prompt = self.assembler.assemble(&examples, question);
                let closest = hits.into_iter().next().ok_or(PipelineError::EmptyCorpus)?;
                (prompt, closest)
            }
        };

        Ok(PreparedPrompt {
            prompt,
            closest_example: closest,
        })
    }

    pub async fn answer_question(&self, question: &str) -> Result<QueryAnswer, PipelineError> {
        let stage = Telemetry::new();
        let prepared = self.prepare(question).await?;
        debug!(elapsed_ms = stage.elapsed_ms(), "Retrieval and prompt assembly done");
        self.answer_prepared(prepared).await
    }

    /// Generation, sanitizing and execution for a prompt built by `prepare`.
    pub async fn answer_prepared(&self, prepared: PreparedPrompt) -> Result<QueryAnswer, PipelineError> {
        let total = Telemetry::new();
        let mut stage = Telemetry::new();

        let raw = self.generator.generate(&prepared.prompt).await?;
        let sql_query = sanitize_sql(&raw).trim().to_string();
        debug!(elapsed_ms = stage.lap_ms(), sql = %preview(&sql_query, 160), "Generated SQL");

        let rows = self.executor.execute(&sql_query).await?;
        debug!(elapsed_ms = stage.lap_ms(), rows = rows.len(), "Executed SQL");

        info!(
            elapsed_ms = total.elapsed_ms(),
            rows = rows.len(),
            question = %preview(&prepared.prompt.question, 80),
            "Answered question"
        );
        Ok(QueryAnswer {
            sql_query,
            rows,
            closest_example: prepared.closest_example,
        })
    }
}
