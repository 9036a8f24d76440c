//! The module defines the [EmbeddingModel] trait, which represents an embedding model that can
//! turn a piece of text into a fixed-length vector.
//!
//! The module also defines the [Embedding] struct, which represents a single text embedding, and
//! the [EmbeddingError] enum, which represents the errors that can occur while producing one.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// Http error (e.g.: connection error, timeout, etc.)
    #[error("HttpError: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Json error (e.g.: serialization, deserialization)
    #[error("JsonError: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The text cannot be embedded (e.g.: it is empty)
    #[error("InvalidInput: {0}")]
    InvalidInput(String),

    /// Error parsing the embedding response
    #[error("ResponseError: {0}")]
    ResponseError(String),

    /// Error returned by the embedding model provider
    #[error("ProviderError: {0}")]
    ProviderError(String),

    /// The provider returned a vector of unexpected length
    #[error("DimensionMismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for embedding models that can generate an embedding for a piece of text.
pub trait EmbeddingModel: Clone + Sync + Send {
    /// The number of dimensions in the embedding vector.
    fn ndims(&self) -> usize;

    /// Embed a single text.
    ///
    /// Implementations must reject empty text with [EmbeddingError::InvalidInput] before
    /// reaching out to the provider (see [validate_text]).
    fn embed_text(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Embedding, EmbeddingError>> + Send;
}

/// Reject text that cannot produce a meaningful embedding.
pub fn validate_text(text: &str) -> Result<(), EmbeddingError> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::InvalidInput(
            "text to embed must not be empty".into(),
        ));
    }
    Ok(())
}

/// Struct that holds a single text and its embedding.
#[derive(Clone, Default, Deserialize, Serialize, Debug)]
pub struct Embedding {
    /// The text that was embedded. Used for debugging.
    pub document: String,
    /// The embedding vector
    pub vec: Vec<f64>,
}

impl PartialEq for Embedding {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Eq for Embedding {}

impl Embedding {
    /// Cosine similarity between this embedding and `other`.
    ///
    /// Returns `None` when the vectors have different lengths, either of them has no magnitude, or
    /// the result is not a finite number (e.g.: a vector holding NaN).
    pub fn cosine_similarity(&self, other: &[f64]) -> Option<f64> {
        if self.vec.len() != other.len() {
            return None;
        }

        let dot_product: f64 = self.vec.iter().zip(other).map(|(x, y)| x * y).sum();
        let norm_a = self.vec.iter().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b = other.iter().map(|x| x * x).sum::<f64>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return None;
        }

        Some(dot_product / (norm_a * norm_b)).filter(|similarity| similarity.is_finite())
    }
}
