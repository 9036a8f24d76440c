//! OpenAI API client, used for query embeddings.
//!
//! # Example
//! ```
//! use newsrag_core::providers::openai;
//!
//! let client = openai::Client::new("YOUR_API_KEY");
//!
//! let model = client.embedding_model(openai::TEXT_EMBEDDING_3_SMALL, 256);
//! ```
use serde::Deserialize;
use serde_json::json;

use crate::embeddings::{self, EmbeddingError, embedding::validate_text};

// ================================================================
// Main OpenAI Client
// ================================================================
const OPENAI_API_BASE_URL: &str = "https://api.openai.com";

#[derive(Clone)]
pub struct Client {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("http_client", &self.http_client)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl Client {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: &str) -> Self {
        Self::from_url(api_key, OPENAI_API_BASE_URL)
    }

    /// Create a new OpenAI client with the given API key and base API URL.
    pub fn from_url(api_key: &str, base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .post(super::join_url(&self.base_url, path))
            .bearer_auth(&self.api_key)
    }

    /// Create an embedding model with the given name and output dimensionality.
    ///
    /// # Example
    /// ```
    /// use newsrag_core::providers::openai::{Client, self};
    ///
    /// let openai = Client::new("your-open-ai-api-key");
    ///
    /// let embedding_model = openai.embedding_model(openai::TEXT_EMBEDDING_3_SMALL, 256);
    /// ```
    pub fn embedding_model(&self, model: &str, ndims: usize) -> EmbeddingModel {
        EmbeddingModel::new(self.clone(), model, ndims)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiResponse<T> {
    Ok(T),
    Err(ApiErrorResponse),
}

// ================================================================
// OpenAI Embedding API
// ================================================================
/// `text-embedding-3-small` embedding model
pub const TEXT_EMBEDDING_3_SMALL: &str = "text-embedding-3-small";

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub object: String,
    pub data: Vec<EmbeddingData>,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingData {
    pub object: String,
    pub embedding: Vec<f64>,
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Clone, Debug)]
pub struct EmbeddingModel {
    client: Client,
    /// Name of the model (e.g.: text-embedding-3-small)
    pub model: String,
    ndims: usize,
}

impl EmbeddingModel {
    pub fn new(client: Client, model: &str, ndims: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            ndims,
        }
    }

    async fn request_embedding(&self, text: &str) -> Result<embeddings::Embedding, EmbeddingError> {
        validate_text(text)?;

        let response = self
            .client
            .post("/v1/embeddings")
            .json(&json!({
                "model": self.model,
                "input": [text],
                "dimensions": self.ndims,
                "encoding_format": "float",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(err) => EmbeddingError::ProviderError(err.error.message),
                Err(_) => EmbeddingError::ProviderError(format!("{status}: {body}")),
            });
        }

        let response = match response.json::<ApiResponse<EmbeddingResponse>>().await? {
            ApiResponse::Ok(response) => response,
            ApiResponse::Err(err) => return Err(EmbeddingError::ProviderError(err.error.message)),
        };

        tracing::debug!(target: "newsrag",
            "Embedding usage: {} prompt tokens, {} total tokens",
            response.usage.prompt_tokens,
            response.usage.total_tokens
        );

        let vec = match response.data.into_iter().next() {
            Some(data) => data.embedding,
            None => {
                return Err(EmbeddingError::ResponseError(
                    "Response contained no embedding".into(),
                ));
            }
        };

        if vec.len() != self.ndims {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.ndims,
                actual: vec.len(),
            });
        }

        Ok(embeddings::Embedding {
            document: text.to_string(),
            vec,
        })
    }
}

impl embeddings::EmbeddingModel for EmbeddingModel {
    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed_text(&self, text: &str) -> Result<embeddings::Embedding, EmbeddingError> {
        self.request_embedding(text).await.inspect_err(|err| {
            tracing::warn!(target: "newsrag", model = %self.model, "Error in embed_text: {err}");
        })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    use super::*;
    use crate::embeddings::EmbeddingModel as _;

    fn embedding_body(vec: Vec<f64>) -> serde_json::Value {
        json!({
            "object": "list",
            "data": [{ "object": "embedding", "embedding": vec, "index": 0 }],
            "model": "text-embedding-3-small",
            "usage": { "prompt_tokens": 8, "total_tokens": 8 }
        })
    }

    #[tokio::test]
    async fn embeds_text_with_fixed_dimensions() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .header("Authorization", "Bearer TEST")
                    .json_body(json!({
                        "model": "text-embedding-3-small",
                        "input": ["I am invested in Alphabet"],
                        "dimensions": 256,
                        "encoding_format": "float",
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(embedding_body(vec![0.0043; 256]));
            })
            .await;

        let model = Client::from_url("TEST", &server.base_url())
            .embedding_model(TEXT_EMBEDDING_3_SMALL, 256);

        let embedding = model.embed_text("I am invested in Alphabet").await.unwrap();

        mock.assert_async().await;
        assert_eq!(embedding.vec.len(), 256);
        assert_eq!(embedding.document, "I am invested in Alphabet");
    }

    #[tokio::test]
    async fn empty_text_never_reaches_the_provider() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(embedding_body(vec![0.1; 256]));
            })
            .await;

        let model = Client::from_url("TEST", &server.base_url())
            .embedding_model(TEXT_EMBEDDING_3_SMALL, 256);

        let err = model.embed_text("").await.unwrap_err();

        assert!(matches!(err, EmbeddingError::InvalidInput(_)));
        mock.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn provider_error_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(401).json_body(json!({
                    "error": {
                        "message": "Incorrect API key provided",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": "invalid_api_key"
                    }
                }));
            })
            .await;

        let model = Client::from_url("WRONG", &server.base_url())
            .embedding_model(TEXT_EMBEDDING_3_SMALL, 256);

        match model.embed_text("Apple").await {
            Err(EmbeddingError::ProviderError(message)) => {
                assert_eq!(message, "Incorrect API key provided")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_dimensionality_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(embedding_body(vec![0.1; 1536]));
            })
            .await;

        let model = Client::from_url("TEST", &server.base_url())
            .embedding_model(TEXT_EMBEDDING_3_SMALL, 256);

        assert!(matches!(
            model.embed_text("Microsoft").await,
            Err(EmbeddingError::DimensionMismatch {
                expected: 256,
                actual: 1536
            })
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = Client::new("sk-secret");
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}
