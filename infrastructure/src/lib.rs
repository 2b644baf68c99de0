pub mod config;
pub mod embedder;
pub mod embedding_storage;
pub mod executor;
pub mod gemini_client;
pub mod generator;
pub mod ollama_client;
pub mod search;
