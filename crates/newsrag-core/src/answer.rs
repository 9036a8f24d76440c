//! Answer generation grounded on retrieved news.
//!
//! The [Answerer] retrieves the records matching a query, renders them as a plain-text context
//! (one line per record, see [SearchResult::context_line]) and asks a completion model to answer
//! the query from that context under a fixed system instruction.

use crate::{
    completion::{CompletionError, CompletionModel},
    config::PipelineConfig,
    embeddings::EmbeddingModel,
    news::SearchResult,
    retriever::{RetrieveError, Retriever},
    vector_store::VectorSearchIndex,
};

/// System instruction of the news aggregator.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a news aggregator providing up to date information to retail investors based on what investments they have. Once told what companies a user has investments in, you provide them with any important information related to their investments";

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("RetrieveError: {0}")]
    Retrieve(#[from] RetrieveError),

    #[error("CompletionError: {0}")]
    Completion(#[from] CompletionError),
}

/// A generated answer together with the context it was grounded on.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub text: String,
    /// The "source information" given to the model
    pub context: String,
}

/// Concatenate the context lines of `results`, in order.
pub fn build_context(results: &[SearchResult]) -> String {
    results.iter().map(SearchResult::context_line).collect()
}

/// The single user message sent to the completion model.
pub fn user_prompt(query: &str, context: &str) -> String {
    format!("Answer this user query: {query} with the following context: {context}")
}

pub struct Answerer<C, M, I>
where
    C: CompletionModel,
    M: EmbeddingModel,
    I: VectorSearchIndex,
{
    model: C,
    retriever: Retriever<M, I>,
    system_instruction: String,
    max_tokens: u64,
}

impl<C, M, I> Answerer<C, M, I>
where
    C: CompletionModel,
    M: EmbeddingModel,
    I: VectorSearchIndex,
{
    pub fn new(model: C, retriever: Retriever<M, I>, config: &PipelineConfig) -> Self {
        Self {
            model,
            retriever,
            system_instruction: config.system_instruction.clone(),
            max_tokens: config.max_tokens,
        }
    }

    pub fn retriever(&self) -> &Retriever<M, I> {
        &self.retriever
    }

    /// Retrieve the news relevant to `query` and answer it from them.
    ///
    /// No retry: a failed completion is returned as [AnswerError::Completion].
    pub async fn answer(&self, query: &str) -> Result<Answer, AnswerError> {
        let results = self.retriever.retrieve(query).await?;
        let context = build_context(&results);

        tracing::debug!(target: "newsrag", results = results.len(), "Built answer context");

        let response = self
            .model
            .completion_request(&user_prompt(query, &context))
            .preamble(self.system_instruction.clone())
            .max_tokens(self.max_tokens)
            .send()
            .await
            .inspect_err(|err| {
                tracing::error!(target: "newsrag", "Completion failed: {err}");
            })?;

        Ok(Answer {
            text: response.text,
            context,
        })
    }
}
