//! Retrieval service clients: vector-search HTTP client and mock.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fusion_core::{Corpus, FusionError, RankedResultSet, Result, RetrievalConfig, Retriever};

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    corpus: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    doc_id: String,
    score: f32,
}

/// Client for a vector-search HTTP service.
///
/// Posts `{query, corpus, top_k}` to `/api/search` and expects scored hits
/// ordered by the service. Scores are kept as-is; only their relative order
/// within one response matters downstream.
pub struct HttpRetriever {
    client: Client,
    config: RetrievalConfig,
}

impl HttpRetriever {
    /// Create a retriever from retrieval configuration.
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FusionError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str, corpus: &Corpus) -> Result<RankedResultSet> {
        let url = format!("{}/api/search", self.config.base_url);
        let request = SearchRequest {
            query,
            corpus: &corpus.name,
            top_k: self.config.top_k,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FusionError::retrieval_failed(query, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FusionError::retrieval_failed(
                query,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| FusionError::retrieval_failed(query, format!("malformed response: {}", e)))?;

        debug!(
            "Query {:?} returned {} hits from {:?}",
            query,
            body.results.len(),
            corpus.name
        );

        Ok(body
            .results
            .into_iter()
            .map(|hit| (hit.doc_id, hit.score))
            .collect())
    }
}

/// Deterministic retrieval for tests and offline runs.
///
/// Stands in for a vector-search backend: each (query, document) pair hashes
/// to a stable pseudo-score in `[0.7, 0.9)`, and roughly six documents in ten
/// match any given query. Identical inputs always produce identical result
/// sets.
pub struct MockRetriever {
    top_k: usize,
}

impl MockRetriever {
    /// Create a mock retriever with default settings.
    pub fn new() -> Self {
        Self { top_k: 10 }
    }

    /// Create a mock retriever returning at most `top_k` documents.
    pub fn with_top_k(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Default for MockRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &str, corpus: &Corpus) -> Result<RankedResultSet> {
        let mut hits: Vec<(String, f32)> = corpus
            .documents
            .keys()
            .filter_map(|doc_id| {
                let hash = pair_hash(query, doc_id);
                if hash % 10 < 6 {
                    let score = 0.7 + (hash % 200) as f32 / 1000.0;
                    Some((doc_id.clone(), score))
                } else {
                    None
                }
            })
            .collect();

        // Descending score; the corpus iterates id-ascending, so the stable
        // sort leaves score ties in identifier order.
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(self.top_k);

        Ok(hits.into_iter().collect())
    }
}

fn pair_hash(query: &str, doc_id: &str) -> u64 {
    query
        .bytes()
        .chain(std::iter::once(0))
        .chain(doc_id.bytes())
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_core::DocumentMeta;

    fn corpus() -> Corpus {
        let mut corpus = Corpus::new("field-manuals");
        for i in 1..=10 {
            corpus.insert(
                format!("doc{}", i),
                DocumentMeta::new(format!("manual-{}.pdf", i)),
            );
        }
        corpus
    }

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let retriever = MockRetriever::new();
        let corpus = corpus();

        let first = retriever.retrieve("q1", &corpus).await.unwrap();
        let second = retriever.retrieve("q1", &corpus).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mock_returns_scored_subset() {
        let retriever = MockRetriever::new();
        let results = retriever.retrieve("q1", &corpus()).await.unwrap();

        // "q1" selects doc1..doc5 from this corpus
        let ids: Vec<_> = results.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["doc5", "doc4", "doc3", "doc2", "doc1"]);

        for (_, score) in results.iter() {
            assert!((0.7..0.9).contains(&score), "score out of band: {}", score);
        }
        assert!((results.ranked()[0].1 - 0.745).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_mock_orders_by_descending_score() {
        let retriever = MockRetriever::new();
        let results = retriever.retrieve("llama habitats", &corpus()).await.unwrap();

        let ranked = results.ranked();
        assert_eq!(ranked[0].0, "doc2");
        assert_eq!(ranked[1].0, "doc1");
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[tokio::test]
    async fn test_mock_respects_top_k() {
        let retriever = MockRetriever::with_top_k(3);
        let results = retriever.retrieve("alpha", &corpus()).await.unwrap();

        // "alpha" matches seven documents; only the three best survive
        let ids: Vec<_> = results.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["doc10", "doc9", "doc8"]);
    }

    #[tokio::test]
    async fn test_mock_on_empty_corpus() {
        let retriever = MockRetriever::new();
        let results = retriever
            .retrieve("q1", &Corpus::new("empty"))
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
