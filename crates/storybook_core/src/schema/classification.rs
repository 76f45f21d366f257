//! Chat-turn classification.

use super::{OutputSchema, Validate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storybook_error::ValidationError;

/// What a chat message asks for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatAction {
    /// Modify the script
    Edit,
    /// Answer without modifying anything
    Question,
}

/// Oracle output for the classification call. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Classification {
    /// Routed action
    pub action: ChatAction,
}

impl OutputSchema for Classification {
    const NAME: &'static str = "classification";
}

impl Validate for Classification {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
