//! Public storybook discovery.

use super::MAX_LIMIT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storybook_core::Storybook;
use storybook_error::StorybookResult;
use storybook_interface::{StoryStore, StorybookFilter, StorybookSort};
use tracing::instrument;

/// Explore search criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreQuery {
    /// Case-insensitive title substring
    pub q: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Required tags
    pub tags: Vec<String>,
    /// Ordering
    pub sort: StorybookSort,
    /// 1-based page
    pub page: i64,
    /// Page size, at most 100
    pub limit: i64,
}

impl Default for ExploreQuery {
    fn default() -> Self {
        Self {
            q: None,
            category: None,
            tags: Vec::new(),
            sort: StorybookSort::Latest,
            page: 1,
            limit: 20,
        }
    }
}

/// Public author information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    /// Author's user id
    pub id: String,
}

/// A public storybook as shown in explore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicStorybook {
    /// Identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Cover image
    pub cover_image_url: Option<String>,
    /// Author
    pub author: AuthorInfo,
    /// Category
    pub category: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Likes
    pub like_count: i32,
    /// Views
    pub view_count: i32,
    /// Pages
    pub page_count: i32,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<Storybook> for PublicStorybook {
    fn from(storybook: Storybook) -> Self {
        Self {
            id: storybook.id,
            title: storybook.title,
            cover_image_url: storybook.cover_image_url,
            author: AuthorInfo {
                id: storybook.user_id,
            },
            category: storybook.category,
            tags: storybook.tags,
            like_count: storybook.like_count,
            view_count: storybook.view_count,
            page_count: storybook.page_count,
            created_at: storybook.created_at,
        }
    }
}

/// Page position within an explore listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page
    pub page: i64,
    /// Page size
    pub limit: i64,
    /// Matches across all pages
    pub total: i64,
    /// Another page follows
    pub has_next: bool,
    /// A page precedes
    pub has_prev: bool,
}

impl Pagination {
    fn new(page: i64, limit: i64, total: i64) -> Self {
        let offset = (page.max(1) - 1).saturating_mul(limit);
        Self {
            page,
            limit,
            total,
            has_next: offset.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}

/// One page of explore results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorePage {
    /// Storybooks on this page
    pub stories: Vec<PublicStorybook>,
    /// Position in the listing
    pub pagination: Pagination,
}

/// A category with the number of public storybooks in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// URL-friendly identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Public storybooks in the category
    pub count: i64,
}

/// Read-only listing of public storybooks.
#[derive(Clone)]
pub struct ExploreService {
    store: Arc<dyn StoryStore>,
}

impl std::fmt::Debug for ExploreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExploreService").finish_non_exhaustive()
    }
}

impl ExploreService {
    /// Create the service.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// Public storybooks matching `query`.
    #[instrument(skip(self))]
    pub async fn explore(&self, query: ExploreQuery) -> StorybookResult<ExplorePage> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, MAX_LIMIT);
        let filter = StorybookFilter {
            title_query: query.q.filter(|q| !q.trim().is_empty()),
            category: query.category.filter(|c| !c.trim().is_empty()),
            tags: query.tags,
            ..StorybookFilter::public()
        }
        .with_sort(query.sort)
        .with_page(page, limit);

        let listing = self.store.list_storybooks(&filter).await?;
        tracing::debug!(total = listing.total, "Explore listing loaded");
        Ok(ExplorePage {
            stories: listing.items.into_iter().map(PublicStorybook::from).collect(),
            pagination: Pagination::new(page, limit, listing.total),
        })
    }

    /// Categories of public storybooks, most populated first.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> StorybookResult<Vec<CategoryInfo>> {
        let counts = self.store.category_counts().await?;
        Ok(counts
            .into_iter()
            .map(|c| CategoryInfo {
                id: slug(&c.category),
                name: c.category,
                count: c.count,
            })
            .collect())
    }
}

fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_flags() {
        let first = Pagination::new(1, 20, 45);
        assert!(first.has_next && !first.has_prev);
        let last = Pagination::new(3, 20, 45);
        assert!(!last.has_next && last.has_prev);
        let exact = Pagination::new(1, 20, 20);
        assert!(!exact.has_next);
        let huge = Pagination::new(i64::MAX, 100, 45);
        assert!(!huge.has_next && huge.has_prev);
    }

    #[test]
    fn slugs() {
        assert_eq!(slug("Bedtime Stories"), "bedtime-stories");
        assert_eq!(slug("  Friends & Family "), "friends-family");
    }
}
