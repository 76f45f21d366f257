//! The caller's own storybooks.

use super::{MAX_LIMIT, owned_storybook};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storybook_core::{NewStorybook, PipelineState, Storybook, StorybookDetail, StorybookStatus};
use storybook_error::{ServiceError, StorybookResult};
use storybook_interface::{Listing, StoryStore, StorybookFilter, StorybookPatch, StorybookSort};
use tracing::instrument;

/// Request body for creating an empty storybook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStorybook {
    /// Title
    #[serde(default)]
    pub title: String,
    /// Explore category
    #[serde(default)]
    pub category: Option<String>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Listed in explore
    #[serde(default)]
    pub is_public: bool,
}

/// Listing, creation, visibility and deletion of storybooks.
#[derive(Clone)]
pub struct StorybookService {
    store: Arc<dyn StoryStore>,
}

impl std::fmt::Debug for StorybookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorybookService").finish_non_exhaustive()
    }
}

impl StorybookService {
    /// Create the service.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// The caller's storybooks, newest or most liked first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: &str,
        page: i64,
        limit: i64,
        sort: StorybookSort,
    ) -> StorybookResult<Listing<Storybook>> {
        let filter = StorybookFilter::owned_by(user_id)
            .with_sort(sort)
            .with_page(page, limit.clamp(1, MAX_LIMIT));
        self.store.list_storybooks(&filter).await
    }

    /// Create an empty storybook.
    #[instrument(skip(self, request))]
    pub async fn create(&self, user_id: &str, request: CreateStorybook) -> StorybookResult<Storybook> {
        let storybook = self
            .store
            .create_storybook(NewStorybook {
                user_id: user_id.to_string(),
                title: request.title.trim().to_string(),
                status: StorybookStatus::Pending,
                is_public: request.is_public,
                page_count: 0,
                category: request.category,
                tags: request.tags,
                character_ids: Vec::new(),
                creation_params: Some(PipelineState::default()),
            })
            .await?;
        tracing::info!(storybook_id = %storybook.id, "Storybook created");
        Ok(storybook)
    }

    /// A storybook with its pages. Readable by its owner, or by anyone
    /// once public.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &str, storybook_id: &str) -> StorybookResult<StorybookDetail> {
        let storybook = self
            .store
            .get_storybook(storybook_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("storybook", storybook_id))?;
        if !storybook.is_visible_to(user_id) {
            return Err(ServiceError::forbidden("storybook is private").into());
        }
        let pages = self.store.list_pages(storybook_id).await?;
        Ok(StorybookDetail { storybook, pages })
    }

    /// Publish or unpublish a storybook.
    #[instrument(skip(self))]
    pub async fn set_visibility(
        &self,
        user_id: &str,
        storybook_id: &str,
        is_public: bool,
    ) -> StorybookResult<Storybook> {
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        let patch = StorybookPatch {
            is_public: Some(is_public),
            ..StorybookPatch::default()
        };
        self.store.update_storybook(storybook_id, &patch).await
    }

    /// Delete a storybook and its pages.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, storybook_id: &str) -> StorybookResult<()> {
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        if !self.store.delete_storybook(storybook_id).await? {
            return Err(ServiceError::not_found("storybook", storybook_id).into());
        }
        tracing::info!("Storybook deleted");
        Ok(())
    }
}
