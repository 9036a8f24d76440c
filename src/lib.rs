//! Retrieval-augmented answers over a pre-embedded tech news dataset.
//!
//! This crate re-exports [newsrag_core] and, with the `mongodb` feature (enabled by default), the
//! MongoDB store integration as [mongodb].
//!
//! # Example
//! ```rust,ignore
//! use newsrag::{
//!     NewsRagConfig,
//!     answer::Answerer,
//!     dataset::DatasetLoader,
//!     mongodb::{connect, MongoDbNewsStore, MongoDbVectorIndex},
//!     providers::{anthropic, openai},
//!     retriever::Retriever,
//!     vector_store::NewsStore,
//! };
//!
//! let config = NewsRagConfig::from_env()?;
//!
//! let table = DatasetLoader::from_token(config.dataset.token()?)
//!     .load(&config.dataset.urls)
//!     .await?;
//!
//! let client = connect(&config.store.uri).await?;
//! let collection = client.database(&config.store.database).collection(&config.store.collection);
//! MongoDbNewsStore::new(collection.clone()).replace_all(table.records()).await?;
//!
//! let embedding_model = openai::Client::new(&config.credentials.openai_api_key)
//!     .embedding_model(&config.pipeline.embedding_model, config.pipeline.embedding_dims);
//! let retriever = Retriever::new(
//!     embedding_model,
//!     MongoDbVectorIndex::new(collection),
//!     config.search_params()?,
//! );
//!
//! let claude = anthropic::Client::new(&config.credentials.anthropic_api_key)
//!     .completion_model(&config.pipeline.completion_model);
//! let answer = Answerer::new(claude, retriever, &config.pipeline)
//!     .answer("I am invested in Alphabet, Apple and Microsoft")
//!     .await?;
//!
//! println!("{}", answer.text);
//! ```

pub use newsrag_core::*;

#[cfg(feature = "mongodb")]
pub use newsrag_mongodb as mongodb;
