//! Completion collaborator client.
//!
//! The hosted completion service is an external collaborator consumed
//! through a single request/response call: an ordered message list plus
//! retrieval parameters in, generated text out. Nothing of the vendor's
//! retrieval or ranking behavior is reimplemented here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use galleria_core::config::{CompletionConfig, RetrievalConfig};

use crate::assembler::PromptMessage;
use crate::error::ChatError;

/// Narrow contract for the completion collaborator.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produce a reply for the assembled message list.
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ChatError>;
}

/// HTTP client for a hosted chat-completions deployment with an attached
/// managed retrieval index.
pub struct AzureCompletionClient {
    http: reqwest::Client,
    completion: CompletionConfig,
    retrieval: RetrievalConfig,
    /// Passed through as the data source's role_information field.
    role_information: String,
}

impl AzureCompletionClient {
    pub fn new(
        completion: CompletionConfig,
        retrieval: RetrievalConfig,
        role_information: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            completion,
            retrieval,
            role_information,
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.completion.endpoint.trim_end_matches('/'),
            self.completion.deployment,
            self.completion.api_version
        )
    }

    fn build_request<'a>(&self, messages: &'a [PromptMessage]) -> CompletionRequest<'a> {
        // Without a configured index the request degrades to a plain
        // completion; the collaborator rejects empty data source endpoints.
        let data_sources = if self.retrieval.endpoint.is_empty() {
            Vec::new()
        } else {
            vec![DataSource {
                source_type: "azure_search",
                parameters: RetrievalParameters {
                    endpoint: self.retrieval.endpoint.clone(),
                    index_name: self.retrieval.index_name.clone(),
                    semantic_configuration: self.retrieval.semantic_configuration.clone(),
                    query_type: self.retrieval.query_type.clone(),
                    // Opaque collaborator configuration, serialized verbatim.
                    fields_mapping: serde_json::Value::Object(serde_json::Map::new()),
                    in_scope: true,
                    role_information: self.role_information.clone(),
                    filter: None,
                    strictness: self.retrieval.strictness,
                    top_n_documents: self.retrieval.top_n_documents,
                    authentication: Authentication {
                        auth_type: "api_key",
                        key: self.retrieval.api_key.clone(),
                    },
                    embedding_dependency: EmbeddingDependency {
                        dependency_type: "deployment_name",
                        deployment_name: self.retrieval.embedding_deployment.clone(),
                    },
                },
            }]
        };

        CompletionRequest {
            messages,
            max_tokens: self.completion.max_tokens,
            temperature: self.completion.temperature,
            top_p: self.completion.top_p,
            data_sources,
        }
    }
}

#[async_trait]
impl CompletionClient for AzureCompletionClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ChatError> {
        let url = self.request_url();
        debug!(deployment = %self.completion.deployment, turns = messages.len(), "Completion request");

        let response = self
            .http
            .post(&url)
            .header("api-key", &self.completion.api_key)
            .json(&self.build_request(messages))
            .send()
            .await?
            .error_for_status()?
            .json::<CompletionResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ChatError::Completion("completion returned no choices".to_string()))
    }
}

/// Canned-reply client for tests; never touches the network.
pub struct MockCompletionClient {
    pub reply: String,
}

impl MockCompletionClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, _messages: &[PromptMessage]) -> Result<String, ChatError> {
        Ok(self.reply.clone())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [PromptMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    data_sources: Vec<DataSource>,
}

#[derive(Debug, Serialize)]
struct DataSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    parameters: RetrievalParameters,
}

#[derive(Debug, Serialize)]
struct RetrievalParameters {
    endpoint: String,
    index_name: String,
    semantic_configuration: String,
    query_type: String,
    fields_mapping: serde_json::Value,
    in_scope: bool,
    role_information: String,
    filter: Option<String>,
    strictness: u32,
    top_n_documents: u32,
    authentication: Authentication,
    embedding_dependency: EmbeddingDependency,
}

#[derive(Debug, Serialize)]
struct Authentication {
    #[serde(rename = "type")]
    auth_type: &'static str,
    key: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingDependency {
    #[serde(rename = "type")]
    dependency_type: &'static str,
    deployment_name: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AzureCompletionClient {
        let completion = CompletionConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            deployment: "gpt-4o".to_string(),
            api_key: "secret".to_string(),
            ..CompletionConfig::default()
        };
        let retrieval = RetrievalConfig {
            endpoint: "https://example.search.windows.net".to_string(),
            index_name: "mall-knowledge".to_string(),
            api_key: "search-secret".to_string(),
            ..RetrievalConfig::default()
        };
        AzureCompletionClient::new(completion, retrieval, "You help visitors.".to_string())
    }

    #[test]
    fn test_request_url_strips_trailing_slash() {
        let client = test_client();
        assert_eq!(
            client.request_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-05-01-preview"
        );
    }

    #[test]
    fn test_request_carries_retrieval_data_source() {
        let client = test_client();
        let messages = vec![PromptMessage::system("sys"), PromptMessage::user("hello")];
        let body = serde_json::to_value(client.build_request(&messages)).unwrap();

        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["messages"][1]["content"], "hello");

        let params = &body["data_sources"][0]["parameters"];
        assert_eq!(body["data_sources"][0]["type"], "azure_search");
        assert_eq!(params["index_name"], "mall-knowledge");
        assert_eq!(params["query_type"], "vector_simple_hybrid");
        assert_eq!(params["strictness"], 3);
        assert_eq!(params["top_n_documents"], 5);
        assert_eq!(params["in_scope"], true);
        assert_eq!(params["filter"], serde_json::Value::Null);
        assert_eq!(params["fields_mapping"], serde_json::json!({}));
        assert_eq!(params["authentication"]["type"], "api_key");
        assert_eq!(
            params["embedding_dependency"]["deployment_name"],
            "text-embedding-ada-002"
        );
        assert_eq!(params["role_information"], "You help visitors.");
    }

    #[test]
    fn test_request_omits_data_source_without_endpoint() {
        let client = AzureCompletionClient::new(
            CompletionConfig::default(),
            RetrievalConfig {
                endpoint: String::new(),
                ..RetrievalConfig::default()
            },
            String::new(),
        );
        let messages = vec![PromptMessage::user("hello")];
        let body = serde_json::to_value(client.build_request(&messages)).unwrap();
        assert!(body.get("data_sources").is_none());
    }

    #[tokio::test]
    async fn test_mock_client_returns_canned_reply() {
        let client = MockCompletionClient::new("Ouvert de 10h à 20h.");
        let reply = client
            .complete(&[PromptMessage::user("Quels sont les horaires?")])
            .await
            .unwrap();
        assert_eq!(reply, "Ouvert de 10h à 20h.");
    }

    #[test]
    fn test_response_parsing_tolerates_missing_content() {
        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());

        let parsed: CompletionResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
