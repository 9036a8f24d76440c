//! Traits for the document store the news table is loaded into and searched from.

use crate::{
    embeddings::Embedding,
    news::{NewsRecord, SearchResult},
};

pub mod in_memory_store;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    /// Json error (e.g.: serialization, deserialization, etc.)
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Datastore error: {0}")]
    DatastoreError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid search parameters: {0}")]
    InvalidParams(String),
}

/// Parameters of an approximate nearest-neighbour search.
///
/// The candidate pool is the number of neighbours the index examines before keeping the best
/// `limit` of them, so it can never be smaller than `limit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
    index_name: String,
    path: String,
    num_candidates: u32,
    limit: u32,
}

impl SearchParams {
    pub fn new(
        index_name: &str,
        path: &str,
        num_candidates: u32,
        limit: u32,
    ) -> Result<Self, VectorStoreError> {
        if limit == 0 {
            return Err(VectorStoreError::InvalidParams(
                "limit must be greater than zero".into(),
            ));
        }
        if num_candidates < limit {
            return Err(VectorStoreError::InvalidParams(format!(
                "num_candidates ({num_candidates}) must be at least limit ({limit})"
            )));
        }

        Ok(Self {
            index_name: index_name.to_string(),
            path: path.to_string(),
            num_candidates,
            limit,
        })
    }

    /// Name of the vector search index
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Document field holding the vectors
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn num_candidates(&self) -> u32 {
        self.num_candidates
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Outcome of [NewsStore::replace_all].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Documents removed before inserting
    pub deleted: u64,
    pub inserted: u64,
}

/// A collection of news records that can be wiped and reloaded.
pub trait NewsStore: Send + Sync {
    /// Remove every document, then insert `records`. Running it twice with the same records leaves
    /// exactly one copy of each.
    fn replace_all(
        &self,
        records: &[NewsRecord],
    ) -> impl std::future::Future<Output = Result<LoadReport, VectorStoreError>> + Send;

    /// Number of documents currently stored.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, VectorStoreError>> + Send;
}

/// Trait for vector search indexes
pub trait VectorSearchIndex: Send + Sync {
    /// Get the documents closest to `query`, best first, at most `params.limit()` of them.
    /// Results never carry the stored embedding or the store id.
    fn search(
        &self,
        query: &Embedding,
        params: &SearchParams,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResult>, VectorStoreError>> + Send;
}
