//! Provider and model selection.

use serde::{Deserialize, Serialize};

/// LLM vendor a model belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    /// OpenAI
    OpenAi,
    /// Google Gemini
    Google,
    /// Anthropic Claude
    Claude,
}

/// Provider plus model alias for one pipeline call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelChoice {
    /// Provider serving the model
    pub provider: Provider,
    /// Model alias, resolved to a provider model id by the catalog
    pub model: String,
}

impl ModelChoice {
    /// Create a model choice.
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl Default for ModelChoice {
    fn default() -> Self {
        Self::new(Provider::OpenAi, "gpt-5-mini")
    }
}
