//! Model selection per pipeline call site.

use serde::{Deserialize, Serialize};
use storybook_core::{ModelChoice, Provider};

/// Which model serves each stage and chat operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageModels {
    /// Bible stage
    pub bible: ModelChoice,
    /// Arc stage
    pub arc: ModelChoice,
    /// Draft stage
    pub draft: ModelChoice,
    /// Classification and question answering
    pub chat: ModelChoice,
    /// Full-script and plain-text rewrites
    pub rewrite: ModelChoice,
    /// Illustrations
    pub image: ModelChoice,
}

impl Default for StageModels {
    fn default() -> Self {
        Self {
            bible: ModelChoice::default(),
            arc: ModelChoice::default(),
            draft: ModelChoice::default(),
            chat: ModelChoice::default(),
            rewrite: ModelChoice::default(),
            image: ModelChoice::new(Provider::OpenAi, "gpt-image-1"),
        }
    }
}
