//! Record store traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storybook_core::{
    Character, CharacterPatch, NewCharacter, NewPage, NewStorybook, Page, PagePatch,
    PipelineState, Storybook, StorybookStatus,
};
use storybook_error::StorybookResult;

/// Persistence for storybook rows.
#[async_trait]
pub trait StorybookRepository: Send + Sync {
    /// Insert a storybook and return the stored row.
    async fn create_storybook(&self, new: NewStorybook) -> StorybookResult<Storybook>;

    /// Load a storybook by id.
    async fn get_storybook(&self, id: &str) -> StorybookResult<Option<Storybook>>;

    /// Replace `creation_params` if the stored version still equals
    /// `expected_version`, incrementing the version.
    ///
    /// A version mismatch is a conflict error; nothing is written.
    async fn update_creation_params(
        &self,
        id: &str,
        expected_version: i64,
        params: &PipelineState,
    ) -> StorybookResult<Storybook>;

    /// Apply a partial update to plain columns.
    async fn update_storybook(&self, id: &str, patch: &StorybookPatch)
    -> StorybookResult<Storybook>;

    /// Delete a storybook and all of its pages. Returns whether a row existed.
    async fn delete_storybook(&self, id: &str) -> StorybookResult<bool>;

    /// List storybooks matching the filter.
    async fn list_storybooks(&self, filter: &StorybookFilter) -> StorybookResult<Listing<Storybook>>;

    /// Count public storybooks per category.
    async fn category_counts(&self) -> StorybookResult<Vec<CategoryCount>>;
}

/// Persistence for pages. Page numbers stay dense (1..=N) after every call.
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Insert a batch of pages atomically: either every page is stored or none is.
    async fn insert_pages(&self, storybook_id: &str, pages: Vec<NewPage>)
    -> StorybookResult<Vec<Page>>;

    /// All pages of a storybook, ordered by page number.
    async fn list_pages(&self, storybook_id: &str) -> StorybookResult<Vec<Page>>;

    /// One page by number.
    async fn get_page(&self, storybook_id: &str, page_number: i32)
    -> StorybookResult<Option<Page>>;

    /// Apply a partial update to one page.
    async fn update_page(
        &self,
        storybook_id: &str,
        page_number: i32,
        patch: &PagePatch,
    ) -> StorybookResult<Page>;

    /// Append a page after the last one and bump the storybook's page count.
    ///
    /// `page.page_number` is ignored; the page is stored at `page_count + 1`.
    async fn append_page(&self, storybook_id: &str, page: NewPage) -> StorybookResult<Page>;

    /// Delete one page, shift every later page down by one and decrement
    /// the storybook's page count, in one transaction. Returns the new count.
    async fn delete_page(&self, storybook_id: &str, page_number: i32) -> StorybookResult<i32>;
}

/// Persistence for characters.
#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// Fetch characters by id, in the order the ids were first given.
    /// Unknown ids are skipped and repeated ids yield one character.
    async fn get_characters(&self, ids: &[String]) -> StorybookResult<Vec<Character>>;

    /// One character by id.
    async fn get_character(&self, id: &str) -> StorybookResult<Option<Character>>;

    /// Characters owned by `user_id`, optionally followed by presets.
    async fn list_characters(
        &self,
        user_id: &str,
        include_presets: bool,
    ) -> StorybookResult<Vec<Character>>;

    /// Preset characters ordered by name.
    async fn list_presets(&self) -> StorybookResult<Vec<Character>>;

    /// Insert a user-owned character.
    async fn create_character(&self, user_id: &str, new: NewCharacter)
    -> StorybookResult<Character>;

    /// Apply a partial update.
    async fn update_character(&self, id: &str, patch: &CharacterPatch)
    -> StorybookResult<Character>;

    /// Delete a character. Returns whether a row existed.
    async fn delete_character(&self, id: &str) -> StorybookResult<bool>;
}

/// Per-user usage counter used for billing.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Add `tokens` to the user's `credits_used`.
    async fn increment_credits_used(&self, user_id: &str, tokens: i64) -> StorybookResult<()>;
}

/// The full record store.
pub trait StoryStore: StorybookRepository + PageRepository + CharacterRepository + UsageLedger {}

impl<T> StoryStore for T where
    T: StorybookRepository + PageRepository + CharacterRepository + UsageLedger
{
}

/// Partial update of plain storybook columns; only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorybookPatch {
    /// New title
    pub title: Option<String>,
    /// New visibility
    pub is_public: Option<bool>,
    /// New page count
    pub page_count: Option<i32>,
    /// New status
    pub status: Option<StorybookStatus>,
    /// New cover image
    pub cover_image_url: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New tags
    pub tags: Option<Vec<String>>,
}

impl StorybookPatch {
    /// Apply the patch to a storybook in place.
    pub fn apply(&self, storybook: &mut Storybook) {
        if let Some(title) = &self.title {
            storybook.title = title.clone();
        }
        if let Some(is_public) = self.is_public {
            storybook.is_public = is_public;
        }
        if let Some(page_count) = self.page_count {
            storybook.page_count = page_count;
        }
        if let Some(status) = self.status {
            storybook.status = status;
        }
        if let Some(url) = &self.cover_image_url {
            storybook.cover_image_url = Some(url.clone());
        }
        if let Some(category) = &self.category {
            storybook.category = Some(category.clone());
        }
        if let Some(tags) = &self.tags {
            storybook.tags = tags.clone();
        }
    }
}

/// Ordering for storybook listings. Always descending.
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StorybookSort {
    /// Newest first
    #[default]
    Latest,
    /// Most liked first
    Popular,
    /// Most viewed first
    Viewed,
}

/// Filter criteria for listing storybooks. Criteria combine with AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorybookFilter {
    /// Only storybooks owned by this user
    pub owner: Option<String>,
    /// Only public storybooks
    pub public_only: bool,
    /// Case-insensitive title substring
    pub title_query: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Storybooks carrying every one of these tags
    pub tags: Vec<String>,
    /// Ordering
    pub sort: StorybookSort,
    /// Rows to skip
    pub offset: i64,
    /// Maximum rows to return
    pub limit: i64,
}

impl Default for StorybookFilter {
    fn default() -> Self {
        Self {
            owner: None,
            public_only: false,
            title_query: None,
            category: None,
            tags: Vec::new(),
            sort: StorybookSort::default(),
            offset: 0,
            limit: 20,
        }
    }
}

impl StorybookFilter {
    /// Storybooks owned by `user_id`.
    pub fn owned_by(user_id: impl Into<String>) -> Self {
        Self {
            owner: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Public storybooks.
    pub fn public() -> Self {
        Self {
            public_only: true,
            ..Self::default()
        }
    }

    /// Set ordering.
    pub fn with_sort(mut self, sort: StorybookSort) -> Self {
        self.sort = sort;
        self
    }

    /// Set 1-based page and page size. The offset saturates at `i64::MAX`.
    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.limit = limit;
        self.offset = (page.max(1) - 1).saturating_mul(limit.max(0));
        self
    }

    /// Whether a storybook satisfies every criterion.
    pub fn matches(&self, storybook: &Storybook) -> bool {
        if let Some(owner) = &self.owner {
            if &storybook.user_id != owner {
                return false;
            }
        }
        if self.public_only && !storybook.is_public {
            return false;
        }
        if let Some(query) = &self.title_query {
            if !storybook
                .title
                .to_lowercase()
                .contains(&query.to_lowercase())
            {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if storybook.category.as_ref() != Some(category) {
                return false;
            }
        }
        self.tags.iter().all(|tag| storybook.tags.contains(tag))
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// Matches across all pages
    pub total: i64,
}

/// Number of public storybooks in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Category name
    pub category: String,
    /// Public storybooks in it
    pub count: i64,
}
