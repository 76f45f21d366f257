//! Character records.

use crate::BibleCharacter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storybook_error::ValidationError;

/// A reusable character. Presets are system-provided and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Identifier
    pub id: String,
    /// Owning user; `None` for presets
    pub user_id: Option<String>,
    /// Name
    pub character_name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Appearance used to ground illustration
    pub visual_features: String,
    /// Reference image
    pub image_url: Option<String>,
    /// Personality traits
    pub personality_traits: Vec<String>,
    /// Things the character likes
    pub likes: Vec<String>,
    /// Free-form extra data
    pub additional_info: Value,
    /// System-provided preset
    pub is_preset: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Character {
    /// Whether `user_id` may read this character.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_preset || self.user_id.as_deref() == Some(user_id)
    }
}

impl From<&Character> for BibleCharacter {
    fn from(character: &Character) -> Self {
        BibleCharacter {
            character_name: character.character_name.clone(),
            description: character.description.clone().unwrap_or_default(),
            visual_features: character.visual_features.clone(),
        }
    }
}

/// Fields for inserting a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), build_fn(error = "ValidationError"))]
#[serde(deny_unknown_fields)]
pub struct NewCharacter {
    /// Name
    pub character_name: String,
    /// Appearance
    pub visual_features: String,
    /// Description
    #[builder(default)]
    #[serde(default)]
    pub description: Option<String>,
    /// Reference image
    #[builder(default)]
    #[serde(default)]
    pub image_url: Option<String>,
    /// Personality traits
    #[builder(default)]
    #[serde(default)]
    pub personality_traits: Vec<String>,
    /// Likes
    #[builder(default)]
    #[serde(default)]
    pub likes: Vec<String>,
    /// Free-form extra data
    #[builder(default)]
    #[serde(default)]
    pub additional_info: Value,
}

impl NewCharacter {
    /// Start building a new character.
    pub fn builder() -> NewCharacterBuilder {
        NewCharacterBuilder::default()
    }

    /// Reject blank names and appearances.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.character_name.trim().is_empty() {
            return Err(ValidationError::new("character_name", "must not be blank"));
        }
        if self.visual_features.trim().is_empty() {
            return Err(ValidationError::new("visual_features", "must not be blank"));
        }
        Ok(())
    }
}

/// Partial character update; only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacterPatch {
    /// Name
    #[serde(default)]
    pub character_name: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Appearance
    #[serde(default)]
    pub visual_features: Option<String>,
    /// Reference image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Personality traits
    #[serde(default)]
    pub personality_traits: Option<Vec<String>>,
    /// Likes
    #[serde(default)]
    pub likes: Option<Vec<String>>,
    /// Free-form extra data
    #[serde(default)]
    pub additional_info: Option<Value>,
}

impl CharacterPatch {
    /// Whether the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.character_name.is_none()
            && self.description.is_none()
            && self.visual_features.is_none()
            && self.image_url.is_none()
            && self.personality_traits.is_none()
            && self.likes.is_none()
            && self.additional_info.is_none()
    }

    /// Apply the patch to a character in place.
    pub fn apply(&self, character: &mut Character) {
        if let Some(name) = &self.character_name {
            character.character_name = name.clone();
        }
        if let Some(description) = &self.description {
            character.description = Some(description.clone());
        }
        if let Some(visual) = &self.visual_features {
            character.visual_features = visual.clone();
        }
        if let Some(url) = &self.image_url {
            character.image_url = Some(url.clone());
        }
        if let Some(traits) = &self.personality_traits {
            character.personality_traits = traits.clone();
        }
        if let Some(likes) = &self.likes {
            character.likes = likes.clone();
        }
        if let Some(info) = &self.additional_info {
            character.additional_info = info.clone();
        }
    }
}
