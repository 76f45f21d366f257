//! Title and page editing for a storybook's owner.

use super::owned_storybook;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storybook_core::{NewPage, Page, PagePatch, Storybook};
use storybook_error::{ServiceError, StorybookResult};
use storybook_interface::{StoryStore, StorybookPatch};
use tracing::instrument;

/// Content for a page appended in the studio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPageContent {
    /// Page text
    #[serde(default)]
    pub script_text: Option<String>,
    /// Prompt for illustration
    #[serde(default)]
    pub image_prompt: Option<String>,
    /// Illustration style tag
    #[serde(default)]
    pub image_style: Option<String>,
    /// Characters appearing on the page
    #[serde(default)]
    pub character_ids: Vec<String>,
    /// Background description
    #[serde(default)]
    pub background_description: Option<String>,
}

impl From<NewPageContent> for NewPage {
    fn from(content: NewPageContent) -> Self {
        NewPage {
            page_number: 0,
            script_text: content.script_text,
            image_prompt: content.image_prompt,
            image_style: content.image_style,
            character_ids: content.character_ids,
            background_description: content.background_description,
        }
    }
}

/// Studio editing operations. Every call checks ownership first.
#[derive(Clone)]
pub struct StudioService {
    store: Arc<dyn StoryStore>,
}

impl std::fmt::Debug for StudioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioService").finish_non_exhaustive()
    }
}

impl StudioService {
    /// Create the service.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// Current title.
    #[instrument(skip(self))]
    pub async fn get_title(&self, user_id: &str, storybook_id: &str) -> StorybookResult<String> {
        let storybook = owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        Ok(storybook.title)
    }

    /// Rename the storybook. The title is trimmed and must not be blank.
    #[instrument(skip(self))]
    pub async fn update_title(
        &self,
        user_id: &str,
        storybook_id: &str,
        title: &str,
    ) -> StorybookResult<Storybook> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::bad_request("title must not be blank").into());
        }
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        let patch = StorybookPatch {
            title: Some(title.to_string()),
            ..StorybookPatch::default()
        };
        self.store.update_storybook(storybook_id, &patch).await
    }

    /// One page.
    #[instrument(skip(self))]
    pub async fn get_page(
        &self,
        user_id: &str,
        storybook_id: &str,
        page_number: i32,
    ) -> StorybookResult<Page> {
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        self.store
            .get_page(storybook_id, page_number)
            .await?
            .ok_or_else(|| ServiceError::not_found("page", page_number.to_string()).into())
    }

    /// Apply the provided fields to a page.
    #[instrument(skip(self, patch))]
    pub async fn update_page(
        &self,
        user_id: &str,
        storybook_id: &str,
        page_number: i32,
        patch: &PagePatch,
    ) -> StorybookResult<Page> {
        if patch.is_empty() {
            return Err(ServiceError::bad_request("no page fields to update").into());
        }
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        self.store.update_page(storybook_id, page_number, patch).await
    }

    /// Append a page after the last one.
    #[instrument(skip(self, content))]
    pub async fn add_page(
        &self,
        user_id: &str,
        storybook_id: &str,
        content: NewPageContent,
    ) -> StorybookResult<Page> {
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        let page = self.store.append_page(storybook_id, content.into()).await?;
        tracing::info!(page_number = page.page_number, "Page added");
        Ok(page)
    }

    /// Delete a page and close the gap. Returns the new page count.
    #[instrument(skip(self))]
    pub async fn delete_page(
        &self,
        user_id: &str,
        storybook_id: &str,
        page_number: i32,
    ) -> StorybookResult<i32> {
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        let page_count = self.store.delete_page(storybook_id, page_number).await?;
        tracing::info!(page_count, "Page deleted");
        Ok(page_count)
    }
}
