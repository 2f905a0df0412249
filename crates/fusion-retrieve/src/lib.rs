//! fusion-retrieve - Retrieval service clients
//!
//! This crate implements the retrieval contract twice: an HTTP client for a
//! vector-search service, and a deterministic in-memory mock for tests and
//! offline runs. Callers pick one by injection; relevance scores are opaque,
//! locally scaled numbers either way.

mod http;

pub use http::{HttpRetriever, MockRetriever};

// Re-export the contract for convenience
pub use fusion_core::Retriever;
