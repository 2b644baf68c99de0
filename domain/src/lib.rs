pub mod corpus;
pub mod errors;
pub mod models;
pub mod ports;
pub mod prompt;
pub mod sanitizer;
