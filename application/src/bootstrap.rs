use crate::retriever::Retriever;
use crate::sql_service::{PromptStrategy, SqlService};
use anyhow::Context;
use domain::corpus::{ExampleCorpus, T_SHIRT_SCHEMA};
use domain::prompt::{PromptAssembler, DEFAULT_INSTRUCTIONS};
use infrastructure::config::{Config, PromptExamples};
use infrastructure::embedding_storage::EmbeddingStorage;
use infrastructure::executor::SqliteExecutor;
use infrastructure::generator::AnyGenerator;
use infrastructure::ollama_client::OllamaClient;
use shared::types::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub type AppService = SqlService<OllamaClient, AnyGenerator, SqliteExecutor>;

pub fn prompt_strategy(config: &Config) -> PromptStrategy {
    match config.prompt_examples {
        PromptExamples::All => PromptStrategy::FullCorpus,
        PromptExamples::Retrieved => PromptStrategy::Retrieved {
            k: config.retrieval_top_k,
        },
    }
}

/// Wire the configured backends around the bundled corpus and embed it once.
pub async fn build_service(config: &Config) -> Result<AppService> {
    let corpus = Arc::new(ExampleCorpus::t_shirt_store());
    let ollama = OllamaClient::new(
        &config.ollama_base_url,
        &config.embedding_model,
        &config.ollama_model,
        config.request_timeout,
    )?;
    let generator = AnyGenerator::from_config(config, &ollama)?;

    let cache = match config.embedding_cache_path.as_deref() {
        Some(path) => match EmbeddingStorage::new(path) {
            Ok(storage) => Some(storage),
            Err(e) => {
                warn!("Embedding cache at {path} unavailable, embedding without it: {e:#}");
                None
            }
        },
        None => None,
    };

    let retriever = Retriever::build(corpus, ollama, cache.as_ref())
        .await
        .context("Failed to index the example corpus")?;

    let strategy = prompt_strategy(config);
    info!(
        examples = retriever.corpus().len(),
        generator = generator.name(),
        ?strategy,
        "SQL service ready"
    );
    Ok(SqlService::new(
        retriever,
        PromptAssembler::new(DEFAULT_INSTRUCTIONS, T_SHIRT_SCHEMA),
        generator,
        SqliteExecutor::new(&config.db_path),
        strategy,
    ))
}
