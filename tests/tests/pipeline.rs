use application::retriever::Retriever;
use application::sql_service::PromptStrategy;
use domain::corpus::ExampleCorpus;
use domain::errors::PipelineError;
use domain::models::{Example, Row};
use domain::ports::{Embedder, VectorIndex};
use domain::sanitizer::sanitize_sql;
use infrastructure::embedding_storage::EmbeddingStorage;
use infrastructure::executor::{SqliteExecutor, EMPTY_QUERY};
use infrastructure::search::FlatL2Index;
use serde_json::json;
use std::sync::Arc;
use tests::{
    build_service, seed_store_db, store_corpus, KeywordEmbedder, RecordingExecutor, Reply,
    ScriptedGenerator,
};

const STOCK_QUESTION: &str = "How many total t-shirts are left in stock?";
const STOCK_SQL: &str = "SELECT SUM(stock_quantity) FROM t_shirts;";

fn total_row(value: i64) -> Row {
    let mut row = Row::new();
    row.insert("SUM(stock_quantity)".to_string(), json!(value));
    row
}

#[tokio::test]
async fn corpus_question_is_its_own_nearest_neighbour() {
    let corpus = store_corpus();
    let retriever = Retriever::build(corpus.clone(), KeywordEmbedder::default(), None)
        .await
        .unwrap();
    for (position, example) in corpus.examples().iter().enumerate() {
        let hit = retriever.retrieve(&example.question).await.unwrap();
        assert_eq!(hit.position, position, "{}", example.question);
        assert_eq!(hit.distance, 0.0);
    }
}

#[tokio::test]
async fn search_results_are_sorted_by_distance() {
    let corpus = store_corpus();
    let vectors: Vec<Vec<f32>> = corpus.questions().map(KeywordEmbedder::vector_for).collect();
    let index = FlatL2Index::build(vectors).unwrap();
    for query in ["average discount", "Nike white XS", "records", "revenue size M"] {
        let hits = index
            .search(&KeywordEmbedder::vector_for(query), index.len())
            .unwrap();
        assert_eq!(hits.len(), corpus.len());
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}

#[tokio::test]
async fn reordering_the_corpus_keeps_the_same_match() {
    let original = store_corpus();
    let mut reversed: Vec<Example> = original.examples().to_vec();
    reversed.reverse();
    let reversed = Arc::new(ExampleCorpus::new(reversed).unwrap());

    let a = Retriever::build(original, KeywordEmbedder::default(), None)
        .await
        .unwrap();
    let b = Retriever::build(reversed, KeywordEmbedder::default(), None)
        .await
        .unwrap();
    for question in [
        "How many Nike t-shirts are left in stock?",
        "What is the average discount?",
        "Show me all discount records",
    ] {
        let left = a.retrieve(question).await.unwrap();
        let right = b.retrieve(question).await.unwrap();
        assert_eq!(left.question, right.question);
        assert_eq!(left.sql, right.sql);
        assert_eq!(left.distance, right.distance);
        assert_ne!(left.position, right.position);
    }
}

#[tokio::test]
async fn scenario_exact_question_round_trips_its_sql() {
    let corpus = store_corpus();
    let generator = ScriptedGenerator::echoing(&corpus);
    let executor = RecordingExecutor::returning(vec![total_row(50)]);
    let statements = executor.statements();
    let service = build_service(
        corpus,
        KeywordEmbedder::default(),
        generator,
        executor,
        PromptStrategy::FullCorpus,
    )
    .await;

    let answer = service.answer_question(STOCK_QUESTION).await.unwrap();

    assert_eq!(answer.closest_example.question, STOCK_QUESTION);
    assert_eq!(answer.closest_example.distance, 0.0);
    assert_eq!(answer.sql_query, STOCK_SQL);
    assert_eq!(answer.rows, vec![total_row(50)]);
    assert_eq!(*statements.lock().unwrap(), vec![STOCK_SQL.to_string()]);
}

#[tokio::test]
async fn scenario_quota_stops_before_execution() {
    let generator = ScriptedGenerator::new(Reply::Quota);
    let executor = RecordingExecutor::default();
    let statements = executor.statements();
    let service = build_service(
        store_corpus(),
        KeywordEmbedder::default(),
        generator,
        executor,
        PromptStrategy::FullCorpus,
    )
    .await;

    let err = service.answer_question(STOCK_QUESTION).await.unwrap_err();

    assert!(matches!(err, PipelineError::QuotaExceeded(_)));
    assert_eq!(err.kind(), "quota_exceeded");
    assert!(statements.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scenario_backticks_are_stripped() {
    assert_eq!(sanitize_sql("`SELECT * FROM t_shirts;`"), "SELECT * FROM t_shirts;");

    let generator = ScriptedGenerator::new(Reply::Fixed("`SELECT * FROM t_shirts;`".into()));
    let executor = RecordingExecutor::default();
    let statements = executor.statements();
    let service = build_service(
        store_corpus(),
        KeywordEmbedder::default(),
        generator,
        executor,
        PromptStrategy::FullCorpus,
    )
    .await;

    let answer = service.answer_question("Show me every t-shirt").await.unwrap();
    assert_eq!(answer.sql_query, "SELECT * FROM t_shirts;");
    assert_eq!(
        *statements.lock().unwrap(),
        vec!["SELECT * FROM t_shirts;".to_string()]
    );
}

#[tokio::test]
async fn blank_generated_sql_reports_an_empty_query() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("store.db");
    seed_store_db(&db_path).unwrap();

    for raw in ["```", "", "  \n "] {
        let service = build_service(
            store_corpus(),
            KeywordEmbedder::default(),
            ScriptedGenerator::new(Reply::Fixed(raw.into())),
            SqliteExecutor::new(&db_path),
            PromptStrategy::FullCorpus,
        )
        .await;
        let err = service.answer_question(STOCK_QUESTION).await.unwrap_err();
        assert_eq!(err, PipelineError::ExecutionFailure(EMPTY_QUERY.into()), "{raw:?}");
    }
}

#[tokio::test]
async fn scenario_empty_question_touches_nothing() {
    let embedder = KeywordEmbedder::default();
    let embed_calls = embedder.counter();
    let generator = ScriptedGenerator::new(Reply::Fixed("SELECT 1;".into()));
    let generate_calls = generator.counter();
    let executor = RecordingExecutor::default();
    let statements = executor.statements();
    let service = build_service(
        store_corpus(),
        embedder,
        generator,
        executor,
        PromptStrategy::FullCorpus,
    )
    .await;
    let after_startup = embed_calls.count();

    for question in ["", "   "] {
        let err = service.answer_question(question).await.unwrap_err();
        assert_eq!(err, PipelineError::EmptyQuestion);
    }

    assert_eq!(embed_calls.count(), after_startup);
    assert_eq!(generate_calls.count(), 0);
    assert!(statements.lock().unwrap().is_empty());
}

#[tokio::test]
async fn prepared_prompt_is_answered_without_re_embedding() {
    let corpus = store_corpus();
    let embedder = KeywordEmbedder::default();
    let embed_calls = embedder.counter();
    let service = build_service(
        corpus.clone(),
        embedder,
        ScriptedGenerator::echoing(&corpus),
        RecordingExecutor::returning(vec![total_row(50)]),
        PromptStrategy::FullCorpus,
    )
    .await;
    let after_startup = embed_calls.count();

    let prepared = service.prepare(STOCK_QUESTION).await.unwrap();
    let answer = service.answer_prepared(prepared).await.unwrap();

    assert_eq!(embed_calls.count(), after_startup + 1);
    assert_eq!(answer.sql_query, STOCK_SQL);
    assert_eq!(answer.closest_example.question, STOCK_QUESTION);
}

#[tokio::test]
async fn embedding_outage_surfaces_distinctly() {
    let err = Retriever::build(store_corpus(), KeywordEmbedder::failing(), None)
        .await
        .err();
    assert!(matches!(err, Some(PipelineError::EmbeddingFailure(_))));
}

#[tokio::test]
async fn stale_cached_vector_fails_index_build() {
    let corpus = store_corpus();
    let embedder = KeywordEmbedder::default();
    let storage = EmbeddingStorage::in_memory().unwrap();
    let stale = corpus.get(3).unwrap();
    storage
        .insert_embeddings(embedder.model(), &[(stale.question.as_str(), &[1.0, 2.0, 3.0][..])])
        .unwrap();

    let err = Retriever::build(corpus, embedder, Some(&storage)).await.err();
    assert_eq!(
        err,
        Some(PipelineError::DimensionMismatch {
            expected: tests::DIMENSION,
            actual: 3
        })
    );
}

#[tokio::test]
async fn generation_failure_is_opaque() {
    let service = build_service(
        store_corpus(),
        KeywordEmbedder::default(),
        ScriptedGenerator::new(Reply::Failure("upstream said: invalid key AIza-secret".into())),
        RecordingExecutor::default(),
        PromptStrategy::FullCorpus,
    )
    .await;
    let err = service.answer_question(STOCK_QUESTION).await.unwrap_err();
    assert_eq!(err.kind(), "generation_failure");
    assert!(!err.public_message().contains("AIza-secret"));
}

#[tokio::test]
async fn execution_failure_keeps_the_database_message() {
    let service = build_service(
        store_corpus(),
        KeywordEmbedder::default(),
        ScriptedGenerator::new(Reply::Fixed("SELECT * FROM shirts".into())),
        RecordingExecutor::failing("no such table: shirts"),
        PromptStrategy::FullCorpus,
    )
    .await;
    let err = service.answer_question("anything").await.unwrap_err();
    assert_eq!(err, PipelineError::ExecutionFailure("no such table: shirts".into()));
    assert_eq!(err.public_message(), "no such table: shirts");
}

// Reference behaviour: the closest example is computed and reported, but the
// prompt is grounded on the whole corpus regardless of what retrieval found.
#[tokio::test]
async fn full_corpus_prompt_does_not_depend_on_retrieval() {
    let corpus = store_corpus();
    let generator = ScriptedGenerator::new(Reply::Fixed("SELECT 1;".into()));
    let prompts = generator.prompts();
    let service = build_service(
        corpus.clone(),
        KeywordEmbedder::default(),
        generator,
        RecordingExecutor::default(),
        PromptStrategy::FullCorpus,
    )
    .await;

    let stock = service.answer_question(STOCK_QUESTION).await.unwrap();
    let discount = service
        .answer_question("What is the average discount?")
        .await
        .unwrap();
    assert_ne!(stock.closest_example.position, discount.closest_example.position);

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].grounding, prompts[1].grounding);
    for example in corpus.examples() {
        assert!(prompts[0].grounding.contains(&example.sql));
    }
}

#[tokio::test]
async fn retrieved_strategy_grounds_on_nearest_examples() {
    let corpus = store_corpus();
    let generator = ScriptedGenerator::new(Reply::Fixed("SELECT 1;".into()));
    let prompts = generator.prompts();
    let service = build_service(
        corpus,
        KeywordEmbedder::default(),
        generator,
        RecordingExecutor::default(),
        PromptStrategy::Retrieved { k: 2 },
    )
    .await;

    service
        .answer_question("What is the average discount?")
        .await
        .unwrap();

    let prompts = prompts.lock().unwrap();
    let grounding = &prompts[0].grounding;
    assert_eq!(grounding.matches("  SQL: ").count(), 2);
    assert!(grounding.contains("SELECT AVG(pct_discount) FROM discounts;"));
    assert!(grounding.contains("SELECT MAX(pct_discount) FROM discounts;"));
}

#[tokio::test]
async fn end_to_end_against_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("store.db");
    seed_store_db(&db_path).unwrap();

    let corpus = store_corpus();
    let service = build_service(
        corpus.clone(),
        KeywordEmbedder::default(),
        ScriptedGenerator::echoing(&corpus),
        SqliteExecutor::new(&db_path),
        PromptStrategy::FullCorpus,
    )
    .await;

    let answer = service.answer_question(STOCK_QUESTION).await.unwrap();
    assert_eq!(answer.rows, vec![total_row(50)]);

    let nike = service
        .answer_question("Tell me all the Nike t-shirts?")
        .await
        .unwrap();
    assert_eq!(nike.rows.len(), 1);
    assert_eq!(nike.rows[0]["color"], "White");
}
