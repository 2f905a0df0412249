//! fusion-core - Core types and traits for the RAG fusion system
//!
//! This crate provides the foundational types, trait contracts, and error
//! handling used throughout the rag-fusion workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{FusionError, Result};
pub use traits::*;
pub use types::*;
