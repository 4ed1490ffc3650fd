//! Aggregated research-paper search over multiple scholarly APIs, with
//! abstract retrieval and LLM-backed summaries, served as a JSON HTTP API.

pub mod aggregate;
pub mod apis;
pub mod config;
pub mod llm;
pub mod server;
pub mod summarize;
