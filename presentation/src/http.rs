use application::sql_service::SqlService;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use domain::errors::PipelineError;
use domain::models::QueryAnswer;
use domain::ports::{Embedder, Executor, Generator};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::types::Result;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub question: Option<String>,
}

/// Request or pipeline failure rendered as `{"error", "kind"}` with a status per error kind.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    /// Body that is not JSON, not `application/json`, or has a non-string `question`.
    InvalidRequest(JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(err) => match err {
                PipelineError::EmptyQuestion => StatusCode::BAD_REQUEST,
                PipelineError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
                PipelineError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
                PipelineError::EmbeddingFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::ExecutionFailure(_)
                | PipelineError::EmptyCorpus
                | PipelineError::DimensionMismatch { .. }
                | PipelineError::CorpusMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidRequest(rejection) => rejection.status(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Pipeline(err) => err.kind(),
            ApiError::InvalidRequest(_) => "invalid_request",
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Pipeline(err) => err.public_message(),
            ApiError::InvalidRequest(rejection) => rejection.body_text(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Pipeline(err) if status.is_server_error() => error!(kind = err.kind(), "{err}"),
            ApiError::Pipeline(err) => warn!(kind = err.kind(), "{err}"),
            ApiError::InvalidRequest(rejection) => warn!(kind = self.kind(), "{rejection}"),
        }
        let body = Json(json!({
            "error": self.public_message(),
            "kind": self.kind(),
        }));
        (status, body).into_response()
    }
}

pub async fn get_sql_query<E, G, X>(
    State(service): State<Arc<SqlService<E, G, X>>>,
    payload: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> std::result::Result<Json<QueryAnswer>, ApiError>
where
    E: Embedder + 'static,
    G: Generator + 'static,
    X: Executor + 'static,
{
    let Json(request) = payload?;
    let question = request.question.unwrap_or_default();
    let answer = service.answer_question(&question).await?;
    Ok(Json(answer))
}

pub async fn health<E, G, X>(State(service): State<Arc<SqlService<E, G, X>>>) -> Json<Value>
where
    E: Embedder + 'static,
    G: Generator + 'static,
    X: Executor + 'static,
{
    Json(json!({
        "status": "ok",
        "examples": service.corpus().len(),
        "dimension": service.dimension(),
    }))
}

pub async fn list_examples<E, G, X>(State(service): State<Arc<SqlService<E, G, X>>>) -> Json<Value>
where
    E: Embedder + 'static,
    G: Generator + 'static,
    X: Executor + 'static,
{
    let examples: Vec<Value> = service
        .corpus()
        .examples()
        .iter()
        .enumerate()
        .map(|(position, example)| {
            json!({
                "position": position,
                "question": example.question,
                "sql": example.sql,
            })
        })
        .collect();
    Json(Value::Array(examples))
}

pub fn router<E, G, X>(service: Arc<SqlService<E, G, X>>) -> Router
where
    E: Embedder + 'static,
    G: Generator + 'static,
    X: Executor + 'static,
{
    Router::new()
        .route("/get_sql_query", post(get_sql_query::<E, G, X>))
        .route("/health", get(health::<E, G, X>))
        .route("/api/examples", get(list_examples::<E, G, X>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn serve<E, G, X>(service: Arc<SqlService<E, G, X>>, host: &str, port: u16) -> Result<()>
where
    E: Embedder + 'static,
    G: Generator + 'static,
    X: Executor + 'static,
{
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, router(service)).await?;
    Ok(())
}
