use serde::{Deserialize, Serialize};

/// One vector per corpus question or incoming question. Length is fixed by the embedding model.
pub type EmbeddingVector = Vec<f32>;

/// A result row as column name -> value, in select-list order.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub sql: String,
}

impl Example {
    pub fn new(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: sql.into(),
        }
    }
}

/// A search hit: corpus position plus Euclidean distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedExample {
    pub position: usize,
    pub question: String,
    pub sql: String,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub sql_query: String,
    #[serde(rename = "sql_result")]
    pub rows: Vec<Row>,
    pub closest_example: RetrievedExample,
}
