//! Text and structured generation over chat completions.

use crate::{
    ChatCompletionRequest, ChatCompletionResponse, Endpoint, JsonSchemaFormat, Message,
    ModelCatalog, ResponseFormat, extract_json,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use storybook_core::{ModelChoice, Provider, TokenUsage};
use storybook_error::{ConfigError, OracleError, OracleErrorKind, StorybookResult};
use storybook_interface::{StoryOracle, StructuredRequest, StructuredResponse, TextResponse};
use tracing::instrument;

const STRUCTURED_INSTRUCTION: &str = "You write children's picture books. Reply with a single JSON document that follows the provided schema exactly. Do not add commentary.";

/// [`StoryOracle`] backed by OpenAI-compatible chat completion endpoints,
/// one per provider.
#[derive(Debug, Clone)]
pub struct ChatCompletionsOracle {
    client: reqwest::Client,
    catalog: ModelCatalog,
    endpoints: HashMap<Provider, Endpoint>,
}

impl ChatCompletionsOracle {
    /// Create an oracle with no endpoints configured.
    pub fn new(catalog: ModelCatalog) -> Self {
        tracing::debug!("Creating chat completions oracle");
        Self {
            client: reqwest::Client::new(),
            catalog,
            endpoints: HashMap::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Route `provider` to `endpoint`.
    pub fn with_endpoint(mut self, provider: Provider, endpoint: Endpoint) -> Self {
        self.endpoints.insert(provider, endpoint);
        self
    }

    fn route(&self, choice: &ModelChoice) -> Result<(&Endpoint, &str), ConfigError> {
        let endpoint = self.endpoints.get(&choice.provider).ok_or_else(|| {
            ConfigError::new(format!("no endpoint configured for provider '{}'", choice.provider))
        })?;
        let model_id = self.catalog.resolve(choice)?;
        Ok((endpoint, model_id))
    }

    #[instrument(skip(self, endpoint, request), fields(model = %request.model))]
    async fn complete(
        &self,
        endpoint: &Endpoint,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OracleError> {
        let url = endpoint.url("/chat/completions");
        tracing::debug!(url = %url, "Sending chat completion request");

        let response = endpoint
            .authorize(self.client.post(&url).json(request))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Chat completion request failed");
                OracleError::new(OracleErrorKind::Http(e.to_string()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Provider returned error");
            return Err(OracleError::new(OracleErrorKind::Api {
                status: status.as_u16(),
                message: body,
            }));
        }

        response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse chat completion response");
            OracleError::new(OracleErrorKind::Deserialization(e.to_string()))
        })
    }
}

fn reply_text<'a>(
    response: &'a ChatCompletionResponse,
    what: &str,
) -> Result<&'a str, OracleError> {
    if let Some(refusal) = response
        .choices
        .first()
        .and_then(|choice| choice.message.refusal.as_deref())
    {
        tracing::warn!(refusal, "Model refused the request");
        return Err(OracleError::new(OracleErrorKind::EmptyResponse(format!(
            "{} (refused: {})",
            what, refusal
        ))));
    }
    response
        .first_content()
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| OracleError::new(OracleErrorKind::EmptyResponse(what.to_string())))
}

#[async_trait]
impl StoryOracle for ChatCompletionsOracle {
    #[instrument(skip(self, request), fields(provider = %request.model.provider, schema = %request.schema_name))]
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> StorybookResult<StructuredResponse> {
        let (endpoint, model_id) = self.route(&request.model)?;
        let body = ChatCompletionRequest::builder()
            .model(model_id)
            .messages(vec![
                Message::system(STRUCTURED_INSTRUCTION),
                Message::user(request.prompt.as_str()),
            ])
            .response_format(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: request.schema_name.clone(),
                    strict: true,
                    schema: request.schema.clone(),
                },
            })
            .build()?;

        let response = self.complete(endpoint, &body).await?;
        let content = reply_text(&response, &request.schema_name)?;
        let json = extract_json(content)?;
        let value: Value = serde_json::from_str(&json).map_err(|e| {
            OracleError::new(OracleErrorKind::Deserialization(format!(
                "{} reply is not valid JSON: {}",
                request.schema_name, e
            )))
        })?;
        let usage = response
            .usage
            .map(TokenUsage::from)
            .unwrap_or_else(|| TokenUsage::estimate(&request.prompt, content));

        tracing::debug!(tokens = usage.total(), "Structured generation complete");
        Ok(StructuredResponse { value, usage })
    }

    #[instrument(skip(self, prompt), fields(provider = %model.provider, model = %model.model))]
    async fn generate_text(
        &self,
        model: &ModelChoice,
        prompt: &str,
    ) -> StorybookResult<TextResponse> {
        let (endpoint, model_id) = self.route(model)?;
        let body = ChatCompletionRequest::builder()
            .model(model_id)
            .messages(vec![Message::user(prompt)])
            .build()?;

        let response = self.complete(endpoint, &body).await?;
        let text = reply_text(&response, "text generation")?.trim().to_string();
        let usage = response
            .usage
            .map(TokenUsage::from)
            .unwrap_or_else(|| TokenUsage::estimate(prompt, &text));

        tracing::debug!(tokens = usage.total(), "Text generation complete");
        Ok(TextResponse { text, usage })
    }
}
