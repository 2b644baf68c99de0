use anyhow::{anyhow, Context};
use domain::errors::{EmbeddingError, GenerationError};
use domain::models::EmbeddingVector;
use domain::ports::{Embedder, Generator};
use domain::prompt::Prompt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::sync::Arc;
use std::time::Duration;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Message,
    #[serde(default)]
    done: bool,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Arc<Client>,
    base_url: String,
    embedding_model: String,
    chat_model: String,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        embedding_model: &str,
        chat_model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Ollama HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            embedding_model: embedding_model.to_string(),
            chat_model: chat_model.to_string(),
        })
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed contacting Ollama")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama embeddings error ({status}): {body}"));
        }
        let embedding_response: EmbeddingResponse = response.json().await?;
        if embedding_response.embedding.is_empty() {
            return Err(anyhow!(
                "Ollama returned an empty embedding for model {}",
                self.embedding_model
            ));
        }
        Ok(embedding_response.embedding)
    }

    pub async fn generate_response(&self, prompt: &Prompt) -> std::result::Result<String, GenerationError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: prompt.grounding.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.question.clone(),
                },
            ],
            stream: false,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Failed(format!("Failed contacting Ollama: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::QuotaExceeded(text));
        }
        if !status.is_success() {
            return Err(GenerationError::Failed(format!(
                "Ollama API error ({status}): {text}"
            )));
        }
        parse_chat_body(&text)
    }
}

/// Collect assistant content from a chat body, which may be one JSON object or NDJSON.
fn parse_chat_body(text: &str) -> std::result::Result<String, GenerationError> {
    let mut full_content = String::new();
    let mut parsed_any = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(chat_resp) = serde_json::from_str::<ChatResponse>(line) {
            parsed_any = true;
            full_content.push_str(&chat_resp.message.content);
            if chat_resp.done {
                break;
            }
        }
    }
    if !parsed_any {
        return Err(GenerationError::Failed(
            "Ollama chat response could not be parsed".to_string(),
        ));
    }
    Ok(full_content.trim().to_string())
}

impl Embedder for OllamaClient {
    fn model(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, text: &str) -> std::result::Result<EmbeddingVector, EmbeddingError> {
        self.generate_embedding(text)
            .await
            .map_err(|e| EmbeddingError(format!("{e:#}")))
    }
}

impl Generator for OllamaClient {
    async fn generate(&self, prompt: &Prompt) -> std::result::Result<String, GenerationError> {
        self.generate_response(prompt).await
    }
}
