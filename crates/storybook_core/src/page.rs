//! Page records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storybook_error::ValidationError;

/// One physical page of a storybook. Page numbers are dense and 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Identifier
    pub id: String,
    /// Owning storybook
    pub storybook_id: String,
    /// 1-based position
    pub page_number: i32,
    /// Page text
    pub script_text: Option<String>,
    /// Generated illustration
    pub image_url: Option<String>,
    /// Narration audio
    pub audio_url: Option<String>,
    /// Prompt for illustration
    pub image_prompt: Option<String>,
    /// Illustration style tag
    pub image_style: Option<String>,
    /// Characters appearing on this page
    pub character_ids: Vec<String>,
    /// Background description
    pub background_description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), build_fn(error = "ValidationError"))]
pub struct NewPage {
    /// 1-based position
    pub page_number: i32,
    /// Page text
    #[builder(default)]
    pub script_text: Option<String>,
    /// Prompt for illustration
    #[builder(default)]
    pub image_prompt: Option<String>,
    /// Illustration style tag
    #[builder(default)]
    pub image_style: Option<String>,
    /// Characters appearing on this page
    #[builder(default)]
    pub character_ids: Vec<String>,
    /// Background description
    #[builder(default)]
    pub background_description: Option<String>,
}

impl NewPage {
    /// Start building a new page.
    pub fn builder() -> NewPageBuilder {
        NewPageBuilder::default()
    }

    /// A text-only page.
    pub fn with_text(page_number: i32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            script_text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Partial page update; only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagePatch {
    /// Page text
    #[serde(default)]
    pub script_text: Option<String>,
    /// Generated illustration
    #[serde(default)]
    pub image_url: Option<String>,
    /// Narration audio
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Prompt for illustration
    #[serde(default)]
    pub image_prompt: Option<String>,
    /// Illustration style tag
    #[serde(default)]
    pub image_style: Option<String>,
    /// Characters appearing on this page
    #[serde(default)]
    pub character_ids: Option<Vec<String>>,
    /// Background description
    #[serde(default)]
    pub background_description: Option<String>,
}

impl PagePatch {
    /// Whether the patch would change nothing.
    ///
    /// ```
    /// use storybook_core::PagePatch;
    ///
    /// assert!(PagePatch::default().is_empty());
    /// let patch = PagePatch { script_text: Some("Once".into()), ..Default::default() };
    /// assert!(!patch.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.script_text.is_none()
            && self.image_url.is_none()
            && self.audio_url.is_none()
            && self.image_prompt.is_none()
            && self.image_style.is_none()
            && self.character_ids.is_none()
            && self.background_description.is_none()
    }

    /// Apply the patch to a page in place.
    pub fn apply(&self, page: &mut Page) {
        if let Some(text) = &self.script_text {
            page.script_text = Some(text.clone());
        }
        if let Some(url) = &self.image_url {
            page.image_url = Some(url.clone());
        }
        if let Some(url) = &self.audio_url {
            page.audio_url = Some(url.clone());
        }
        if let Some(prompt) = &self.image_prompt {
            page.image_prompt = Some(prompt.clone());
        }
        if let Some(style) = &self.image_style {
            page.image_style = Some(style.clone());
        }
        if let Some(ids) = &self.character_ids {
            page.character_ids = ids.clone();
        }
        if let Some(background) = &self.background_description {
            page.background_description = Some(background.clone());
        }
    }
}
