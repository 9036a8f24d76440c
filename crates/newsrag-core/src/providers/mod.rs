//! Clients for the model providers the pipeline talks to.
//!
//! - OpenAI, for query embeddings ([openai::EmbeddingModel])
//! - Anthropic, for answer generation ([anthropic::CompletionModel])
//!
//! Each provider has its own module, which contains a `Client` used to create models. Every
//! client accepts a base URL override so it can be pointed at a proxy or a mock server.
//!
//! # Example
//! ```
//! use newsrag_core::providers::{anthropic, openai};
//!
//! let openai = openai::Client::new("your-openai-api-key");
//! let embedding_model = openai.embedding_model(openai::TEXT_EMBEDDING_3_SMALL, 256);
//!
//! let anthropic = anthropic::ClientBuilder::new("your-anthropic-api-key").build();
//! let opus = anthropic.completion_model(anthropic::CLAUDE_3_OPUS);
//! ```

pub mod anthropic;
pub mod openai;

/// Join a base URL and an API path without doubling or dropping the separating slash.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
