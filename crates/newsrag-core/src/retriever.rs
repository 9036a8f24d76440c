//! Query-time retrieval: embed the query, then search the index with it.

use crate::{
    embeddings::{EmbeddingError, EmbeddingModel},
    news::SearchResult,
    vector_store::{SearchParams, VectorSearchIndex, VectorStoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    /// The query could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The vector search failed
    #[error("Search error: {0}")]
    Search(#[from] VectorStoreError),
}

/// Finds the news records most relevant to a free-text query.
///
/// # Example
/// ```rust
/// use newsrag_core::{
///     providers::openai,
///     retriever::Retriever,
///     vector_store::{in_memory_store::InMemoryVectorStore, SearchParams},
/// };
///
/// let model = openai::Client::new("OPENAI_API_KEY").embedding_model(openai::TEXT_EMBEDDING_3_SMALL, 256);
/// let params = SearchParams::new("vector_index", "embedding", 150, 5).unwrap();
///
/// let retriever = Retriever::new(model, InMemoryVectorStore::new(), params);
/// ```
#[derive(Clone, Debug)]
pub struct Retriever<M: EmbeddingModel, I: VectorSearchIndex> {
    model: M,
    index: I,
    params: SearchParams,
}

impl<M: EmbeddingModel, I: VectorSearchIndex> Retriever<M, I> {
    pub fn new(model: M, index: I, params: SearchParams) -> Self {
        Self {
            model,
            index,
            params,
        }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Best matches for `query`, best first, at most `limit` of them.
    ///
    /// An empty vector means the search ran and matched nothing; an embedding failure is always
    /// reported as [RetrieveError::Embedding].
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, RetrieveError> {
        let embedding = self.model.embed_text(query).await?;

        let mut results = self
            .index
            .search(&embedding, &self.params)
            .await
            .inspect_err(|err| {
                tracing::error!(target: "newsrag",
                    index = self.params.index_name(),
                    "Vector search failed: {err}"
                );
            })?;
        results.truncate(self.params.limit() as usize);

        tracing::info!(target: "newsrag",
            "Selected documents: {}",
            results
                .iter()
                .map(|result| format!(
                    "{} ({})",
                    result.title.as_deref().unwrap_or("untitled"),
                    result.score
                ))
                .collect::<Vec<String>>()
                .join(", ")
        );

        Ok(results)
    }
}
