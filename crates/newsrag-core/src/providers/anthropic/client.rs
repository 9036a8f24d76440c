//! Anthropic client api implementation
use super::completion::{ANTHROPIC_VERSION_LATEST, CompletionModel};

// ================================================================
// Main Anthropic Client
// ================================================================
const ANTHROPIC_API_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Clone, Debug)]
pub struct ClientBuilder<'a> {
    api_key: &'a str,
    base_url: &'a str,
    anthropic_version: &'a str,
}

/// Create a new anthropic client using the builder
///
/// # Example
/// ```
/// use newsrag_core::providers::anthropic::{ClientBuilder, self};
///
/// let anthropic_client = ClientBuilder::new("your-claude-api-key")
///    .anthropic_version(anthropic::ANTHROPIC_VERSION_LATEST)
///    .build();
/// ```
impl<'a> ClientBuilder<'a> {
    pub fn new(api_key: &'a str) -> Self {
        Self {
            api_key,
            base_url: ANTHROPIC_API_BASE_URL,
            anthropic_version: ANTHROPIC_VERSION_LATEST,
        }
    }

    pub fn base_url(mut self, base_url: &'a str) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn anthropic_version(mut self, anthropic_version: &'a str) -> Self {
        self.anthropic_version = anthropic_version;
        self
    }

    pub fn build(self) -> Client {
        Client {
            base_url: self.base_url.to_string(),
            api_key: self.api_key.to_string(),
            anthropic_version: self.anthropic_version.to_string(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[derive(Clone)]
pub struct Client {
    /// The base URL
    base_url: String,
    /// The API key
    api_key: String,
    /// Value of the `anthropic-version` header
    anthropic_version: String,
    /// The underlying HTTP client
    http_client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("http_client", &self.http_client)
            .field("api_key", &"<REDACTED>")
            .field("anthropic_version", &self.anthropic_version)
            .finish()
    }
}

impl Client {
    /// Create a new Anthropic client with the given API key and the default base URL and version.
    pub fn new(api_key: &str) -> Self {
        ClientBuilder::new(api_key).build()
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .post(crate::providers::join_url(&self.base_url, path))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.anthropic_version)
    }

    /// Create a completion model with the given name.
    pub fn completion_model(&self, model: &str) -> CompletionModel {
        CompletionModel::new(self.clone(), model)
    }
}
