//! Story bible: characters, setting and thematic summary.

use super::{OutputSchema, Validate, require_text};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storybook_error::ValidationError;

/// A character as it appears in the bible and in prompt grounding blocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BibleCharacter {
    /// Character name
    pub character_name: String,
    /// Personality and role in the story
    pub description: String,
    /// Appearance used to ground illustration
    pub visual_features: String,
}

/// Output of the bible stage, stored at `creation_params.bible`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StoryBible {
    /// Cast of the story; never empty
    #[schemars(length(min = 1))]
    pub characters: Vec<BibleCharacter>,
    /// Setting name
    pub name: String,
    /// When the story takes place
    pub time_period: String,
    /// Kind of place, e.g. "enchanted forest"
    pub location_type: String,
    /// Setting description
    pub description: String,
    /// Rules that hold in this world
    pub world_rules: String,
    /// Central theme
    pub main_theme: String,
    /// Central conflict
    pub main_conflict: String,
    /// How the conflict resolves
    pub conflict_resolution: String,
}

impl StoryBible {
    /// Combine fixed characters with a generated setting.
    pub fn from_parts(characters: Vec<BibleCharacter>, setting: SettingOnly) -> Self {
        Self {
            characters,
            name: setting.name,
            time_period: setting.time_period,
            location_type: setting.location_type,
            description: setting.description,
            world_rules: setting.world_rules,
            main_theme: setting.main_theme,
            main_conflict: setting.main_conflict,
            conflict_resolution: setting.conflict_resolution,
        }
    }

    /// Names of all characters, in bible order.
    pub fn character_names(&self) -> Vec<&str> {
        self.characters
            .iter()
            .map(|c| c.character_name.as_str())
            .collect()
    }
}

impl OutputSchema for StoryBible {
    const NAME: &'static str = "story_bible";
}

impl Validate for StoryBible {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.characters.is_empty() {
            return Err(ValidationError::new(
                "characters",
                "expected at least 1 item, got 0",
            ));
        }
        for (index, character) in self.characters.iter().enumerate() {
            require_text(
                &format!("characters[{}].character_name", index),
                &character.character_name,
            )?;
        }
        require_text("name", &self.name)
    }
}

/// Setting-only output requested when the cast is fixed by preset characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SettingOnly {
    /// Setting name
    pub name: String,
    /// When the story takes place
    pub time_period: String,
    /// Kind of place
    pub location_type: String,
    /// Setting description
    pub description: String,
    /// Rules that hold in this world
    pub world_rules: String,
    /// Central theme
    pub main_theme: String,
    /// Central conflict
    pub main_conflict: String,
    /// How the conflict resolves
    pub conflict_resolution: String,
}

impl OutputSchema for SettingOnly {
    const NAME: &'static str = "story_setting";
}

impl Validate for SettingOnly {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}
