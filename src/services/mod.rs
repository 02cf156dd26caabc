// src/services/mod.rs
pub mod analysis;
pub mod cache;
pub mod llm;
pub mod prompt;
