//! Google Gemini `generateContent` backend.

use anyhow::Context;
use domain::errors::GenerationError;
use domain::ports::Generator;
use domain::prompt::Prompt;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use shared::types::Result;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;
        Ok(Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.trim_start_matches("models/").to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(prompt: &Prompt) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": prompt.grounding},
                    {"text": prompt.question}
                ]
            }]
        })
    }
}

/// Classify a non-success response. Quota exhaustion shows up as HTTP 429 and/or a
/// `RESOURCE_EXHAUSTED` status in the error body.
fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let exhausted = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/status")
                .and_then(Value::as_str)
                .map(|s| s == "RESOURCE_EXHAUSTED")
        })
        .unwrap_or(false);
    if status == StatusCode::TOO_MANY_REQUESTS || exhausted {
        GenerationError::QuotaExceeded(format!("Gemini {status}"))
    } else {
        GenerationError::Failed(format!("Gemini API error ({status}): {body}"))
    }
}

fn parse_response(json: &Value) -> std::result::Result<String, GenerationError> {
    json.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            GenerationError::Failed("Missing candidates[0].content.parts[0].text".to_string())
        })
}

impl Generator for GeminiClient {
    async fn generate(&self, prompt: &Prompt) -> std::result::Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Failed(format!("Failed contacting Gemini: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Failed(e.without_url().to_string()))?;
        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }
        let json: Value = serde_json::from_str(&text)
            .map_err(|e| GenerationError::Failed(format!("Invalid Gemini response: {e}")))?;
        parse_response(&json)
    }
}
