//! fusion-llm - LLM-backed collaborators for the fusion pipeline
//!
//! This crate implements the query expansion and answer synthesis contracts
//! against an Ollama-compatible generate endpoint.
//!
//! # Features
//!
//! - `/api/generate` client with bounded exponential-backoff retry
//! - Query expansion with list-format response parsing
//! - Answer synthesis over the fused document ordering
//! - Deterministic mock implementations for tests and offline runs

mod ollama;

pub use ollama::{MockExpander, MockSynthesizer, OllamaExpander, OllamaSynthesizer};

// Re-export the contracts for convenience
pub use fusion_core::{QueryExpander, Synthesizer};
