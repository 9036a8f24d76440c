//! This module provides functionality for working with embeddings.
//! Embeddings are numerical representations of text used here as a proxy for semantic
//! similarity between a user query and the articles of the news dataset.

pub mod embedding;

pub use embedding::{Embedding, EmbeddingError, EmbeddingModel};
