use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use shared::types::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorBackend {
    Gemini,
    Ollama,
}

impl FromStr for GeneratorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("unknown generator backend '{other}' (expected gemini or ollama)")),
        }
    }
}

/// Which examples end up in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptExamples {
    All,
    Retrieved,
}

impl FromStr for PromptExamples {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "retrieved" => Ok(Self::Retrieved),
            other => Err(anyhow!("unknown prompt example mode '{other}' (expected all or retrieved)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_base_url: String,
    pub embedding_model: String,
    pub ollama_model: String,
    pub generator: GeneratorBackend,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub db_path: String,
    pub embedding_cache_path: Option<String>,
    pub prompt_examples: PromptExamples,
    pub retrieval_top_k: usize,
    pub request_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `load` feeds it the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let google_api_key = lookup("GOOGLE_API_KEY").filter(|k| !k.trim().is_empty());

        let generator = match lookup("GENERATOR") {
            Some(raw) => raw.parse().context("Invalid GENERATOR")?,
            None if google_api_key.is_some() => GeneratorBackend::Gemini,
            None => GeneratorBackend::Ollama,
        };
        let prompt_examples = get("PROMPT_EXAMPLES", "all")
            .parse()
            .context("Invalid PROMPT_EXAMPLES")?;
        let retrieval_top_k: usize = parse_number(&get("RETRIEVAL_TOP_K", "3"), "RETRIEVAL_TOP_K")?;
        if retrieval_top_k == 0 {
            return Err(anyhow!("RETRIEVAL_TOP_K must be at least 1"));
        }
        let timeout_secs: u64 = parse_number(&get("REQUEST_TIMEOUT_SECS", "60"), "REQUEST_TIMEOUT_SECS")?;

        Ok(Self {
            ollama_base_url: get("OLLAMA_BASE_URL", "http://localhost:11434"),
            embedding_model: get("EMBEDDING_MODEL", "all-minilm"),
            ollama_model: get("OLLAMA_MODEL", "qwen2.5-coder:7b"),
            generator,
            google_api_key,
            gemini_model: get("GEMINI_MODEL", "gemini-1.5-flash-latest"),
            db_path: get("DB_PATH", "tshirts.db"),
            embedding_cache_path: Some(get("EMBEDDING_CACHE_PATH", ".askql/embeddings.db"))
                .filter(|p| !p.trim().is_empty()),
            prompt_examples,
            retrieval_top_k,
            request_timeout: Duration::from_secs(timeout_secs),
            host: get("HOST", "0.0.0.0"),
            port: parse_number(&get("PORT", "5000"), "PORT")?,
        })
    }
}

fn parse_number<T>(raw: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid {key}: '{raw}'"))
}
