//! Row types and conversions between rows and domain records.

use crate::schema::{characters, pages, storybooks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use storybook_core::{
    Character, CharacterPatch, NewCharacter, NewPage, NewStorybook, Page, PagePatch,
    PipelineState, Storybook, StorybookStatus,
};
use storybook_error::{DatabaseError, DatabaseErrorKind};
use storybook_interface::StorybookPatch;

/// A storybook row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = storybooks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StorybookRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub cover_image_url: Option<String>,
    pub status: String,
    pub is_public: bool,
    pub page_count: i32,
    pub like_count: i32,
    pub view_count: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub character_ids: Vec<String>,
    pub creation_params: Option<Value>,
    pub params_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StorybookRow> for Storybook {
    type Error = DatabaseError;

    fn try_from(row: StorybookRow) -> Result<Self, Self::Error> {
        let status: StorybookStatus = row.status.parse().map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Serialization(format!(
                "unknown storybook status '{}'",
                row.status
            )))
        })?;
        let creation_params = row
            .creation_params
            .map(PipelineState::from_value)
            .transpose()
            .map_err(|e| {
                DatabaseError::new(DatabaseErrorKind::Serialization(format!(
                    "storybook {}: {}",
                    row.id, e
                )))
            })?;
        Ok(Storybook {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            cover_image_url: row.cover_image_url,
            status,
            is_public: row.is_public,
            page_count: row.page_count,
            like_count: row.like_count,
            view_count: row.view_count,
            category: row.category,
            tags: row.tags,
            character_ids: row.character_ids,
            creation_params,
            params_version: row.params_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable storybook.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = storybooks)]
pub struct NewStorybookRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub status: String,
    pub is_public: bool,
    pub page_count: i32,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub character_ids: Vec<String>,
    pub creation_params: Option<Value>,
}

impl NewStorybookRow {
    /// Build a row with a fresh id.
    pub fn from_new(new: NewStorybook) -> Result<Self, DatabaseError> {
        let creation_params = new
            .creation_params
            .as_ref()
            .map(PipelineState::to_value)
            .transpose()
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Serialization(e.to_string())))?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            title: new.title,
            status: new.status.to_string(),
            is_public: new.is_public,
            page_count: new.page_count,
            category: new.category,
            tags: new.tags,
            character_ids: new.character_ids,
            creation_params,
        })
    }
}

/// Partial storybook update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = storybooks)]
pub struct StorybookChangeset {
    pub title: Option<String>,
    pub is_public: Option<bool>,
    pub page_count: Option<i32>,
    pub status: Option<String>,
    pub cover_image_url: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StorybookPatch> for StorybookChangeset {
    fn from(patch: &StorybookPatch) -> Self {
        Self {
            title: patch.title.clone(),
            is_public: patch.is_public,
            page_count: patch.page_count,
            status: patch.status.map(|s| s.to_string()),
            cover_image_url: patch.cover_image_url.clone(),
            category: patch.category.clone(),
            tags: patch.tags.clone(),
            updated_at: Utc::now(),
        }
    }
}

/// A page row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = pages)]
#[diesel(belongs_to(StorybookRow, foreign_key = storybook_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PageRow {
    pub id: String,
    pub storybook_id: String,
    pub page_number: i32,
    pub script_text: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub image_prompt: Option<String>,
    pub image_style: Option<String>,
    pub character_ids: Vec<String>,
    pub background_description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PageRow> for Page {
    fn from(row: PageRow) -> Self {
        Page {
            id: row.id,
            storybook_id: row.storybook_id,
            page_number: row.page_number,
            script_text: row.script_text,
            image_url: row.image_url,
            audio_url: row.audio_url,
            image_prompt: row.image_prompt,
            image_style: row.image_style,
            character_ids: row.character_ids,
            background_description: row.background_description,
            created_at: row.created_at,
        }
    }
}

/// Insertable page.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pages)]
pub struct NewPageRow {
    pub id: String,
    pub storybook_id: String,
    pub page_number: i32,
    pub script_text: Option<String>,
    pub image_prompt: Option<String>,
    pub image_style: Option<String>,
    pub character_ids: Vec<String>,
    pub background_description: Option<String>,
}

impl NewPageRow {
    /// Build a row with a fresh id.
    pub fn from_new(storybook_id: &str, page: NewPage) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            storybook_id: storybook_id.to_string(),
            page_number: page.page_number,
            script_text: page.script_text,
            image_prompt: page.image_prompt,
            image_style: page.image_style,
            character_ids: page.character_ids,
            background_description: page.background_description,
        }
    }
}

/// Partial page update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = pages)]
pub struct PageChangeset {
    pub script_text: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub image_prompt: Option<String>,
    pub image_style: Option<String>,
    pub character_ids: Option<Vec<String>>,
    pub background_description: Option<String>,
}

impl From<&PagePatch> for PageChangeset {
    fn from(patch: &PagePatch) -> Self {
        Self {
            script_text: patch.script_text.clone(),
            image_url: patch.image_url.clone(),
            audio_url: patch.audio_url.clone(),
            image_prompt: patch.image_prompt.clone(),
            image_style: patch.image_style.clone(),
            character_ids: patch.character_ids.clone(),
            background_description: patch.background_description.clone(),
        }
    }
}

/// A character row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = characters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CharacterRow {
    pub id: String,
    pub user_id: Option<String>,
    pub character_name: String,
    pub description: Option<String>,
    pub visual_features: String,
    pub image_url: Option<String>,
    pub personality_traits: Vec<String>,
    pub likes: Vec<String>,
    pub additional_info: Value,
    pub is_preset: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Character {
            id: row.id,
            user_id: row.user_id,
            character_name: row.character_name,
            description: row.description,
            visual_features: row.visual_features,
            image_url: row.image_url,
            personality_traits: row.personality_traits,
            likes: row.likes,
            additional_info: row.additional_info,
            is_preset: row.is_preset,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insertable user-owned character.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = characters)]
pub struct NewCharacterRow {
    pub id: String,
    pub user_id: Option<String>,
    pub character_name: String,
    pub description: Option<String>,
    pub visual_features: String,
    pub image_url: Option<String>,
    pub personality_traits: Vec<String>,
    pub likes: Vec<String>,
    pub additional_info: Value,
    pub is_preset: bool,
}

impl NewCharacterRow {
    /// Build a user-owned row with a fresh id.
    pub fn owned_by(user_id: &str, new: NewCharacter) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: Some(user_id.to_string()),
            character_name: new.character_name,
            description: new.description,
            visual_features: new.visual_features,
            image_url: new.image_url,
            personality_traits: new.personality_traits,
            likes: new.likes,
            additional_info: if new.additional_info.is_null() {
                Value::Object(Default::default())
            } else {
                new.additional_info
            },
            is_preset: false,
        }
    }
}

/// Partial character update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = characters)]
pub struct CharacterChangeset {
    pub character_name: Option<String>,
    pub description: Option<String>,
    pub visual_features: Option<String>,
    pub image_url: Option<String>,
    pub personality_traits: Option<Vec<String>>,
    pub likes: Option<Vec<String>>,
    pub additional_info: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CharacterPatch> for CharacterChangeset {
    fn from(patch: &CharacterPatch) -> Self {
        Self {
            character_name: patch.character_name.clone(),
            description: patch.description.clone(),
            visual_features: patch.visual_features.clone(),
            image_url: patch.image_url.clone(),
            personality_traits: patch.personality_traits.clone(),
            likes: patch.likes.clone(),
            additional_info: patch.additional_info.clone(),
            updated_at: Utc::now(),
        }
    }
}
