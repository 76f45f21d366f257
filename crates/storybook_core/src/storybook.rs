//! Storybook records.

use crate::{Page, PipelineState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storybook_error::ValidationError;

/// Lifecycle status of a storybook.
///
/// The pipeline driver only ever sets `Pending`; later states belong to
/// illustration and assembly workers.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StorybookStatus {
    /// Created, nothing generated yet
    #[default]
    Pending,
    /// Script generation running
    ScriptGenerating,
    /// Script generated
    ScriptGenerated,
    /// Illustrations running
    ImagesGenerating,
    /// Book being assembled
    Assembling,
    /// Finished
    Complete,
    /// Generation failed
    Failed,
    /// Cancelled by the user
    Canceled,
}

/// A user-owned story project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storybook {
    /// Identifier
    pub id: String,
    /// Owning user (`sub` claim)
    pub user_id: String,
    /// Title
    pub title: String,
    /// Cover image URL
    pub cover_image_url: Option<String>,
    /// Lifecycle status
    pub status: StorybookStatus,
    /// Listed in explore
    pub is_public: bool,
    /// Number of pages
    pub page_count: i32,
    /// Likes received
    pub like_count: i32,
    /// Views received
    pub view_count: i32,
    /// Explore category
    pub category: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Preset characters chosen at creation
    pub character_ids: Vec<String>,
    /// Generation state; `None` when the storybook was created by hand
    pub creation_params: Option<PipelineState>,
    /// Incremented on every `creation_params` write
    pub params_version: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Storybook {
    /// Whether `user_id` owns this storybook.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Whether `user_id` may read this storybook.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_public || self.is_owned_by(user_id)
    }
}

/// A storybook with its pages, ordered by page number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorybookDetail {
    /// The storybook record
    #[serde(flatten)]
    pub storybook: Storybook,
    /// Pages in page-number order
    pub pages: Vec<Page>,
}

/// Fields for inserting a storybook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), build_fn(error = "ValidationError"))]
pub struct NewStorybook {
    /// Owning user
    pub user_id: String,
    /// Title
    #[builder(default)]
    pub title: String,
    /// Initial status
    #[builder(default)]
    pub status: StorybookStatus,
    /// Listed in explore
    #[builder(default)]
    pub is_public: bool,
    /// Initial page count
    #[builder(default)]
    pub page_count: i32,
    /// Explore category
    #[builder(default)]
    pub category: Option<String>,
    /// Tags
    #[builder(default)]
    pub tags: Vec<String>,
    /// Preset characters
    #[builder(default)]
    pub character_ids: Vec<String>,
    /// Initial generation state
    #[builder(default)]
    pub creation_params: Option<PipelineState>,
}

impl NewStorybook {
    /// Start building a new storybook.
    pub fn builder() -> NewStorybookBuilder {
        NewStorybookBuilder::default()
    }
}
