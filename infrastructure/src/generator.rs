use crate::config::{Config, GeneratorBackend};
use crate::gemini_client::GeminiClient;
use crate::ollama_client::OllamaClient;
use anyhow::anyhow;
use domain::errors::GenerationError;
use domain::ports::Generator;
use domain::prompt::Prompt;
use shared::types::Result;

/// Generation backend chosen at startup from configuration.
#[derive(Clone)]
pub enum AnyGenerator {
    Gemini(GeminiClient),
    Ollama(OllamaClient),
}

impl AnyGenerator {
    pub fn from_config(config: &Config, ollama: &OllamaClient) -> Result<Self> {
        match config.generator {
            GeneratorBackend::Gemini => {
                let api_key = config
                    .google_api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("GOOGLE_API_KEY must be set when GENERATOR=gemini"))?;
                Ok(Self::Gemini(GeminiClient::new(
                    api_key,
                    &config.gemini_model,
                    config.request_timeout,
                )?))
            }
            GeneratorBackend::Ollama => Ok(Self::Ollama(ollama.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::Ollama(_) => "ollama",
        }
    }
}

impl Generator for AnyGenerator {
    async fn generate(&self, prompt: &Prompt) -> std::result::Result<String, GenerationError> {
        match self {
            Self::Gemini(client) => client.generate(prompt).await,
            Self::Ollama(client) => client.generate(prompt).await,
        }
    }
}
