//! LLM and image-generation oracle traits.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storybook_core::{ModelChoice, OutputSchema, TokenUsage, Validate, validate_value};
use storybook_error::StorybookResult;
use tracing::instrument;

/// A structured-generation call: prompt plus the JSON Schema the reply must follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequest {
    /// Provider and model alias
    pub model: ModelChoice,
    /// Fully rendered prompt
    pub prompt: String,
    /// Schema name reported to the provider
    pub schema_name: String,
    /// JSON Schema document
    pub schema: Value,
}

/// Raw structured reply, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    /// Parsed JSON body of the reply
    pub value: Value,
    /// Tokens consumed
    pub usage: TokenUsage,
}

/// Free-text reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResponse {
    /// Reply text
    pub text: String,
    /// Tokens consumed
    pub usage: TokenUsage,
}

/// A validated structured reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    /// The validated value
    pub value: T,
    /// Tokens consumed
    pub usage: TokenUsage,
}

/// Text and structured generation.
///
/// Implementations return the provider's JSON as-is; callers go through
/// [`generate_validated`] so unvalidated data never reaches business logic.
#[async_trait]
pub trait StoryOracle: Send + Sync {
    /// Ask for a JSON reply following `request.schema`.
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> StorybookResult<StructuredResponse>;

    /// Ask for a free-text reply.
    async fn generate_text(&self, model: &ModelChoice, prompt: &str)
    -> StorybookResult<TextResponse>;
}

/// Run a structured call for `T` and validate the reply against `T`'s schema.
///
/// A reply that does not match the schema is a validation error naming the
/// offending field; transport or parse failures surface as oracle errors.
#[instrument(skip(oracle, prompt), fields(schema = T::NAME, provider = %model.provider, model = %model.model))]
pub async fn generate_validated<T>(
    oracle: &dyn StoryOracle,
    model: &ModelChoice,
    prompt: String,
) -> StorybookResult<Generated<T>>
where
    T: OutputSchema + Validate + DeserializeOwned,
{
    let request = StructuredRequest {
        model: model.clone(),
        prompt,
        schema_name: T::NAME.to_string(),
        schema: T::output_schema(),
    };
    let response = oracle.generate_structured(request).await?;
    let value = validate_value::<T>(response.value).map_err(|e| {
        tracing::warn!(path = %e.path, message = %e.message, "Oracle reply failed schema validation");
        e
    })?;
    tracing::debug!(tokens = response.usage.total(), "Structured reply validated");
    Ok(Generated {
        value,
        usage: response.usage,
    })
}

/// An image-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Provider and model alias
    pub model: ModelChoice,
    /// Illustration prompt
    pub prompt: String,
    /// Storage path without extension, e.g. `"{storybook_id}/{page_number}"`
    pub storage_path: String,
    /// Existing illustration to keep the style consistent with
    pub reference_image_url: Option<String>,
}

/// A stored illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Public URL
    pub url: String,
    /// Path within storage
    pub storage_path: String,
    /// Size of the stored file
    pub file_size_bytes: u64,
    /// MIME type
    pub mime_type: String,
}

/// Image generation backed by object storage.
#[async_trait]
pub trait ImageOracle: Send + Sync {
    /// Generate an illustration, store it and return where it lives.
    async fn generate_image(&self, request: ImageRequest) -> StorybookResult<GeneratedImage>;
}
