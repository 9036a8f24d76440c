//! Anthropic API client, used for answer generation.
//!
//! # Example
//! ```
//! use newsrag_core::providers::anthropic;
//!
//! let client = anthropic::ClientBuilder::new("YOUR_API_KEY").build();
//!
//! let opus = client.completion_model(anthropic::CLAUDE_3_OPUS);
//! ```

pub mod client;
pub mod completion;

pub use client::{Client, ClientBuilder};
pub use completion::{
    ANTHROPIC_VERSION_2023_06_01, ANTHROPIC_VERSION_LATEST, CLAUDE_3_OPUS, CompletionModel,
};
