//! fusion-query - Rank fusion engine and pipeline
//!
//! This crate merges independently ranked per-query search results into one
//! consensus ranking using Reciprocal Rank Fusion (RRF), and orchestrates
//! the surrounding expand / retrieve / fuse / synthesize pipeline.
//!
//! # Features
//!
//! - Reciprocal Rank Fusion with deterministic tie-breaking
//! - Concurrent per-query retrieval with a join point before fusion
//! - Degrade-or-abort policy for failed retrieval calls
//! - Fallback to the fused ranking when synthesis is unavailable
//!
//! # Example
//!
//! ```rust,ignore
//! use fusion_query::{FusionPipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! let pipeline = FusionPipeline::new(Arc::new(expander), Arc::new(retriever), Arc::new(synth));
//! let outcome = pipeline.answer("impact of climate change", &corpus, PipelineConfig::default()).await?;
//! ```

mod engine;
mod fusion;

pub use engine::{FusionPipeline, PipelineConfig, PipelineOutcome};
pub use fusion::{reciprocal_rank_fusion, DEFAULT_RRF_K};

// Re-export for convenience
pub use fusion_core::{FusedDocument, FusedRanking, RankedResultSet};
