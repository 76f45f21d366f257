//! LLM and image-generation provider clients.
//!
//! Every provider is reached through its OpenAI-compatible HTTP surface:
//! chat completions with a JSON-schema `response_format` for structured
//! calls, and the images API for illustrations. Model aliases used in
//! configuration are resolved to provider model ids by [`ModelCatalog`].
//!
//! # Example
//!
//! ```no_run
//! use storybook_core::ModelChoice;
//! use storybook_interface::StoryOracle;
//! use storybook_models::{ChatCompletionsOracle, Endpoint, ModelCatalog};
//! use storybook_core::Provider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = ChatCompletionsOracle::new(ModelCatalog::default())
//!     .with_endpoint(Provider::OpenAi, Endpoint::new("https://api.openai.com/v1", Some("sk-...")));
//! let reply = oracle
//!     .generate_text(&ModelChoice::default(), "Say hello to a dragon.")
//!     .await?;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod endpoint;
mod extraction;
mod image;
mod oracle;
mod wire;

pub use catalog::ModelCatalog;
pub use endpoint::Endpoint;
pub use extraction::extract_json;
pub use image::ImageGenerationClient;
pub use oracle::ChatCompletionsOracle;
pub use wire::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse, Choice,
    ChoiceMessage, CompletionUsage, JsonSchemaFormat, Message, ResponseFormat,
};
