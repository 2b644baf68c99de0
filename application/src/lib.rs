pub mod bootstrap;
pub mod retriever;
pub mod sql_service;
