//! Trait contracts for the external collaborators.
//!
//! The fusion engine itself is a pure function; query expansion, retrieval,
//! and answer synthesis are injected behind these seams so production
//! clients and deterministic test doubles are interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Corpus, FusedRanking, RankedResultSet};

/// Query expansion service.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Rewrite a user question into several related search queries.
    ///
    /// Must never succeed with zero queries; implementations surface that
    /// case as [`FusionError::ExpansionFailed`](crate::FusionError).
    async fn expand(&self, original_query: &str) -> Result<Vec<String>>;
}

/// Document retrieval service.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Score documents from the corpus against one query.
    ///
    /// Scores are implementation-defined and only comparable within the
    /// returned set. An empty set is a valid result.
    async fn retrieve(&self, query: &str, corpus: &Corpus) -> Result<RankedResultSet>;
}

/// Answer synthesis service.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Produce the user-visible answer from the fused ranking.
    ///
    /// Only the ranking's ordered document-identifier sequence matters to
    /// implementations; raw fused scores are informational.
    async fn synthesize(&self, ranking: &FusedRanking, queries: &[String]) -> Result<String>;
}
