//! Core building blocks of the newsrag pipeline.
//!
//! # Table of contents
//!
//! - [Pipeline](#pipeline)
//! - [Core concepts](#core-concepts)
//!
//! # Pipeline
//! The pipeline answers questions about a pre-embedded tech news dataset in four stages:
//! 1. [dataset::DatasetLoader] downloads one or more Parquet files and concatenates them into a
//!    [dataset::CombinedTable] of [news::NewsRecord]s.
//! 2. A [vector_store::NewsStore] (e.g. the MongoDB store of the `newsrag-mongodb` crate) wipes its
//!    collection and bulk inserts the table.
//! 3. [retriever::Retriever] embeds a free-text query and runs a nearest-neighbour search against
//!    a [vector_store::VectorSearchIndex].
//! 4. [answer::Answerer] turns the matches into a textual context and asks a completion model
//!    for a grounded answer.
//!
//! # Core concepts
//! ## Completion and embedding models
//! Each provider (OpenAI for embeddings, Anthropic for completions) has a `Client` struct used to
//! create models implementing the [embeddings::EmbeddingModel] and
//! [completion::CompletionModel] traits. The retriever and answerer are generic over those
//! traits, so tests can point them at mock servers or swap providers entirely.
//!
//! ## Vector stores and indexes
//! [vector_store::NewsStore] loads records, [vector_store::VectorSearchIndex] searches them.
//! [vector_store::in_memory_store::InMemoryVectorStore] implements both with an exact cosine
//! similarity search and is mostly useful for tests and small datasets.
//!
//! ## Configuration
//! [config::NewsRagConfig] gathers every tunable (model names, embedding dimensions, candidate
//! pool size, result limit, store names, credentials) and is passed explicitly to each component.

pub mod answer;
pub mod completion;
pub mod config;
pub mod dataset;
pub mod embeddings;
pub mod news;
pub mod providers;
pub mod retriever;
pub mod vector_store;

pub use answer::{Answer, AnswerError, Answerer};
pub use config::NewsRagConfig;
pub use news::{NewsRecord, SearchResult};
pub use retriever::{RetrieveError, Retriever};
