pub mod input;
pub mod telemetry;
pub mod types;
pub mod utils;
