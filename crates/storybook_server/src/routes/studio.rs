//! Studio handlers: title, pages and illustration.

use super::AppJson;
use crate::{AppError, AppState, CurrentUser};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use storybook_core::{Page, PagePatch, Storybook};
use storybook_generator::{IllustrationReport, NewPageContent};
use tracing::instrument;

/// Storybook title, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleBody {
    /// Title
    pub title: String,
}

/// Page count after a deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCountResponse {
    /// Pages remaining
    pub page_count: i32,
}

/// Number of image prompts written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePromptsResponse {
    /// Prompts written
    pub written: usize,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn get_title(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TitleBody>, AppError> {
    let title = state.services.studio.get_title(&user.id, &id).await?;
    Ok(Json(TitleBody { title }))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub(super) async fn update_title(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<TitleBody>,
) -> Result<Json<Storybook>, AppError> {
    let storybook = state
        .services
        .studio
        .update_title(&user.id, &id, &body.title)
        .await?;
    Ok(Json(storybook))
}

#[instrument(skip(state, user, content), fields(user_id = %user.id))]
pub(super) async fn add_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(content): AppJson<NewPageContent>,
) -> Result<(StatusCode, Json<Page>), AppError> {
    let page = state.services.studio.add_page(&user.id, &id, content).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn get_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, page_number)): Path<(String, i32)>,
) -> Result<Json<Page>, AppError> {
    let page = state
        .services
        .studio
        .get_page(&user.id, &id, page_number)
        .await?;
    Ok(Json(page))
}

#[instrument(skip(state, user, patch), fields(user_id = %user.id))]
pub(super) async fn update_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, page_number)): Path<(String, i32)>,
    AppJson(patch): AppJson<PagePatch>,
) -> Result<Json<Page>, AppError> {
    let page = state
        .services
        .studio
        .update_page(&user.id, &id, page_number, &patch)
        .await?;
    Ok(Json(page))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn delete_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, page_number)): Path<(String, i32)>,
) -> Result<Json<PageCountResponse>, AppError> {
    let page_count = state
        .services
        .studio
        .delete_page(&user.id, &id, page_number)
        .await?;
    Ok(Json(PageCountResponse { page_count }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn image_prompts(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ImagePromptsResponse>, AppError> {
    let written = state
        .services
        .illustrator
        .generate_image_prompts(&user.id, &id)
        .await?;
    Ok(Json(ImagePromptsResponse { written }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn images(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<IllustrationReport>, AppError> {
    let report = state
        .services
        .illustrator
        .generate_missing_images(&user.id, &id)
        .await?;
    Ok(Json(report))
}
