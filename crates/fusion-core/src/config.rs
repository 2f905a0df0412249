//! Configuration types for the RAG fusion system.
//!
//! Configuration is an explicit struct handed to collaborator constructors
//! at startup; nothing here is process-global.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the RAG fusion system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionConfig {
    /// LLM backend configuration (expansion and synthesis).
    #[serde(default)]
    pub llm: LlmConfig,

    /// Retrieval service configuration.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Rank fusion configuration.
    #[serde(default)]
    pub fusion: RankFusionConfig,
}

/// LLM backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generate endpoint.
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of rewritten queries to request during expansion.
    #[serde(default = "default_num_queries")]
    pub num_queries: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_model(),
            temperature: default_temperature(),
            num_queries: default_num_queries(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Retrieval service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL of the vector-search service.
    #[serde(default = "default_retrieval_url")]
    pub base_url: String,

    /// Maximum documents to request per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: default_retrieval_url(),
            top_k: default_top_k(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Rank fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankFusionConfig {
    /// RRF constant k. Larger values flatten score differences between ranks.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// How to handle a failed retrieval call.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Fall back to showing the fused ranking when synthesis fails.
    #[serde(default = "default_true")]
    pub synthesis_fallback: bool,
}

impl Default for RankFusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            failure_policy: FailurePolicy::default(),
            synthesis_fallback: true,
        }
    }
}

/// Policy for a retrieval call that fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Treat the failed query's result as empty and fuse the rest.
    #[default]
    Degrade,

    /// Abort the whole request on the first failure.
    Abort,
}

// Default value functions

fn default_llm_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_num_queries() -> usize {
    5
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retrieval_url() -> String {
    "http://localhost:8765".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_rrf_k() -> f32 {
    60.0
}

fn default_true() -> bool {
    true
}

impl FusionConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::FusionError::Config {
                message: format!("Failed to parse config: {}", e),
            }
        })?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rag-fusion").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("rag-fusion.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }
}
