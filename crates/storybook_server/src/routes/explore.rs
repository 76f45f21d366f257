//! Public listing handlers.

use crate::{AppError, AppState, CurrentUser};
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use storybook_generator::{CategoryInfo, ExplorePage, ExploreQuery};
use storybook_interface::StorybookSort;
use tracing::instrument;

/// Query of `GET /api/explore`. `tags` is comma-separated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExploreParams {
    /// Title search
    pub q: Option<String>,
    /// Category
    pub category: Option<String>,
    /// Comma-separated tags, all required
    pub tags: Option<String>,
    /// Ordering
    pub sort: Option<StorybookSort>,
    /// 1-based page
    pub page: Option<i64>,
    /// Page size
    pub limit: Option<i64>,
}

impl From<ExploreParams> for ExploreQuery {
    fn from(params: ExploreParams) -> Self {
        let defaults = ExploreQuery::default();
        let tags = params
            .tags
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            q: params.q,
            category: params.category,
            tags,
            sort: params.sort.unwrap_or(defaults.sort),
            page: params.page.unwrap_or(defaults.page),
            limit: params.limit.unwrap_or(defaults.limit),
        }
    }
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn explore(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ExploreParams>,
) -> Result<Json<ExplorePage>, AppError> {
    Ok(Json(state.services.explore.explore(params.into()).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn categories(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<CategoryInfo>>, AppError> {
    Ok(Json(state.services.explore.categories().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_comma_separated_tags() {
        let query: ExploreQuery = ExploreParams {
            tags: Some("bedtime, dragons,,".to_string()),
            page: Some(2),
            ..ExploreParams::default()
        }
        .into();
        assert_eq!(query.tags, vec!["bedtime", "dragons"]);
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort, StorybookSort::Latest);
    }
}
