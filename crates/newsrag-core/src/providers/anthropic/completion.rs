//! Anthropic completion api implementation

use crate::completion::{self, CompletionError};

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::Client;

// ================================================================
// Anthropic Completion API
// ================================================================
/// `claude-3-opus-20240229` completion model
pub const CLAUDE_3_OPUS: &str = "claude-3-opus-20240229";

pub const ANTHROPIC_VERSION_2023_06_01: &str = "2023-06-01";
pub const ANTHROPIC_VERSION_LATEST: &str = ANTHROPIC_VERSION_2023_06_01;

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub content: Vec<Content>,
    pub id: String,
    pub model: String,
    pub role: String,
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub cache_read_input_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub output_tokens: u64,
}

impl TryFrom<CompletionResponse> for completion::CompletionResponse<CompletionResponse> {
    type Error = CompletionError;

    fn try_from(response: CompletionResponse) -> Result<Self, Self::Error> {
        let text = response.content.iter().find_map(|content| match content {
            Content::Text { text } => Some(text.clone()),
            Content::Other => None,
        });

        match text {
            Some(text) => Ok(completion::CompletionResponse {
                text,
                raw_response: response,
            }),
            None => Err(CompletionError::ResponseError(
                "Response did not contain a text block".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug)]
pub struct CompletionModel {
    client: Client,
    pub model: String,
}

impl CompletionModel {
    pub fn new(client: Client, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

impl completion::CompletionModel for CompletionModel {
    type Response = CompletionResponse;

    async fn completion(
        &self,
        completion_request: completion::CompletionRequest,
    ) -> Result<completion::CompletionResponse<CompletionResponse>, CompletionError> {
        // max_tokens is required by the Messages API
        let Some(max_tokens) = completion_request.max_tokens else {
            return Err(CompletionError::RequestError(
                "max_tokens must be set for Anthropic".into(),
            ));
        };

        let request = json!({
            "model": self.model,
            "messages": [Message {
                role: "user".to_owned(),
                content: completion_request.prompt,
            }],
            "max_tokens": max_tokens,
            "system": completion_request.preamble.unwrap_or_default(),
        });

        tracing::debug!(target: "newsrag", model = %self.model, "Sending completion request");

        let response = self.client.post("/v1/messages").json(&request).send().await?;

        if response.status().is_success() {
            match response.json::<ApiResponse<CompletionResponse>>().await? {
                ApiResponse::Message(completion) => {
                    tracing::debug!(target: "newsrag",
                        "Completion usage: {} input tokens, {} output tokens",
                        completion.usage.input_tokens,
                        completion.usage.output_tokens
                    );
                    completion.try_into()
                }
                ApiResponse::Error { error } => Err(CompletionError::ProviderError(error.message)),
            }
        } else {
            let body = response.text().await?;
            Err(match serde_json::from_str::<ApiResponse<CompletionResponse>>(&body) {
                Ok(ApiResponse::Error { error }) => CompletionError::ProviderError(error.message),
                _ => CompletionError::ProviderError(body),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponse<T> {
    Message(T),
    Error { error: ApiErrorResponse },
}
