//! Ollama-backed expansion and synthesis with retry logic.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::warn;

use fusion_core::{FusedRanking, FusionError, LlmConfig, QueryExpander, Result, Synthesizer};

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
///
/// Shared by the expander and the synthesizer; errors are reported as plain
/// reasons so each caller can wrap them in its own error kind.
struct GenerateClient {
    client: Client,
    config: LlmConfig,
}

impl GenerateClient {
    fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FusionError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Send the prompt, retrying transient failures with exponential backoff.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, String> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.try_generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(reason) => {
                    if attempt < self.config.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!(
                            "Generate request failed (attempt {}/{}), retrying in {:?}: {}",
                            attempt + 1,
                            self.config.max_retries + 1,
                            delay,
                            reason
                        );
                        sleep(delay).await;
                    }
                    last_error = Some(reason);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| "unknown error".to_string()))
    }

    async fn try_generate(&self, prompt: &str) -> std::result::Result<String, String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed response: {}", e))?;

        Ok(body.response)
    }
}

/// LLM-backed query expansion.
pub struct OllamaExpander {
    client: GenerateClient,
    num_queries: usize,
}

impl OllamaExpander {
    /// Create an expander from LLM configuration.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: GenerateClient::new(config)?,
            num_queries: config.num_queries,
        })
    }
}

#[async_trait]
impl QueryExpander for OllamaExpander {
    async fn expand(&self, original_query: &str) -> Result<Vec<String>> {
        let prompt = expansion_prompt(original_query, self.num_queries);
        let response = self
            .client
            .generate(&prompt)
            .await
            .map_err(FusionError::expansion_failed)?;

        let queries = parse_query_lines(&response);
        if queries.is_empty() {
            return Err(FusionError::expansion_failed(
                "model returned no usable queries",
            ));
        }
        Ok(queries)
    }
}

/// LLM-backed answer synthesis.
pub struct OllamaSynthesizer {
    client: GenerateClient,
}

impl OllamaSynthesizer {
    /// Create a synthesizer from LLM configuration.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: GenerateClient::new(config)?,
        })
    }
}

#[async_trait]
impl Synthesizer for OllamaSynthesizer {
    async fn synthesize(&self, ranking: &FusedRanking, queries: &[String]) -> Result<String> {
        let prompt = synthesis_prompt(ranking, queries);
        let answer = self
            .client
            .generate(&prompt)
            .await
            .map_err(FusionError::synthesis_failed)?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(FusionError::synthesis_failed(
                "model returned an empty answer",
            ));
        }
        Ok(answer.to_string())
    }
}

fn expansion_prompt(original_query: &str, num_queries: usize) -> String {
    format!(
        "You are an AI assistant that generates multiple search queries based on a \
         single input query.\n\
         Generate multiple search queries related to: {}\n\
         OUTPUT ({} queries, one per line):",
        original_query, num_queries
    )
}

/// Parse one query per line, stripping list numbering and bullets.
fn parse_query_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .map(|line| {
            line.trim_start_matches(|c: char| {
                c.is_ascii_digit() || c == '.' || c == ')' || c == '-' || c == '*'
            })
            .trim_start()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn synthesis_prompt(ranking: &FusedRanking, queries: &[String]) -> String {
    let documents = ranking
        .doc_ids()
        .enumerate()
        .map(|(i, doc_id)| format!("{}. {}", i + 1, doc_id))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a knowledgeable assistant answering a question that was expanded \
         into several search queries.\n\n\
         SEARCH QUERIES:\n{}\n\n\
         DOCUMENTS (most relevant first):\n{}\n\n\
         Write a concise answer grounded in the documents above, citing them by \
         identifier:",
        queries.join("\n"),
        documents
    )
}

/// Deterministic query expansion for tests and offline runs.
///
/// Rewrites the question through a fixed set of templates; at most seven
/// variants are available.
pub struct MockExpander {
    num_queries: usize,
}

const EXPANSION_TEMPLATES: [&str; 7] = [
    "{}",
    "what is {}",
    "{} explained",
    "{} overview",
    "key facts about {}",
    "{} examples",
    "history of {}",
];

impl MockExpander {
    /// Create a mock expander producing five queries, like the original service.
    pub fn new() -> Self {
        Self { num_queries: 5 }
    }

    /// Create a mock expander producing a custom number of queries.
    pub fn with_count(num_queries: usize) -> Self {
        Self {
            num_queries: num_queries.min(EXPANSION_TEMPLATES.len()),
        }
    }
}

impl Default for MockExpander {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryExpander for MockExpander {
    async fn expand(&self, original_query: &str) -> Result<Vec<String>> {
        let original_query = original_query.trim();
        if original_query.is_empty() {
            return Err(FusionError::expansion_failed("empty question"));
        }

        Ok(EXPANSION_TEMPLATES
            .iter()
            .take(self.num_queries)
            .map(|template| template.replace("{}", original_query))
            .collect())
    }
}

/// Deterministic answer synthesis for tests and offline runs.
pub struct MockSynthesizer;

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, ranking: &FusedRanking, queries: &[String]) -> Result<String> {
        let documents: Vec<&str> = ranking.doc_ids().collect();
        Ok(format!(
            "Final output based on {:?} and re-ranked documents: {:?}",
            queries, documents
        ))
    }
}
