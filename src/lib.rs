pub mod analysis;
pub mod config;
pub mod errors;
pub mod execution;
pub mod ingestion;
pub mod llm;
pub mod metrics;
pub mod models;
