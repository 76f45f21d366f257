//! Model alias resolution.

use std::collections::HashMap;
use storybook_core::{ModelChoice, Provider};
use storybook_error::ConfigError;

/// Maps configured model aliases to provider model ids.
///
/// # Example
///
/// ```
/// use storybook_core::{ModelChoice, Provider};
/// use storybook_models::ModelCatalog;
///
/// let catalog = ModelCatalog::default();
/// let choice = ModelChoice::new(Provider::Claude, "claude-sonnet-4-5");
/// assert_eq!(catalog.resolve(&choice).unwrap(), "claude-sonnet-4-5-20250929");
/// assert!(catalog.resolve(&ModelChoice::new(Provider::Google, "gpt-5")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    aliases: HashMap<Provider, HashMap<String, String>>,
}

impl ModelCatalog {
    /// A catalog with no aliases.
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    /// Register `alias` for `provider`.
    pub fn with_alias(
        mut self,
        provider: Provider,
        alias: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        self.aliases
            .entry(provider)
            .or_default()
            .insert(alias.into(), model_id.into());
        self
    }

    /// Provider model id for a configured choice.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the provider has no alias of that name.
    pub fn resolve(&self, choice: &ModelChoice) -> Result<&str, ConfigError> {
        self.aliases
            .get(&choice.provider)
            .and_then(|models| models.get(&choice.model))
            .map(String::as_str)
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "unknown model '{}' for provider '{}'",
                    choice.model, choice.provider
                ))
            })
    }

    /// Aliases known for `provider`, sorted.
    pub fn aliases(&self, provider: Provider) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .aliases
            .get(&provider)
            .map(|models| models.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::empty()
            .with_alias(Provider::OpenAi, "gpt-5", "gpt-5")
            .with_alias(Provider::OpenAi, "gpt-5-mini", "gpt-5-mini")
            .with_alias(Provider::OpenAi, "gpt-5-nano", "gpt-5-nano")
            .with_alias(Provider::OpenAi, "gpt-image-1", "gpt-image-1")
            .with_alias(Provider::Google, "gemini-2.5-flash", "gemini-2.5-flash")
            .with_alias(Provider::Google, "gemini-2.5-pro", "gemini-2.5-pro")
            .with_alias(Provider::Claude, "claude-sonnet-4-5", "claude-sonnet-4-5-20250929")
            .with_alias(Provider::Claude, "claude-sonnet-4", "claude-sonnet-4-20250514")
            .with_alias(Provider::Claude, "claude-haiku-4-5", "claude-haiku-4-5-20251001")
    }
}
