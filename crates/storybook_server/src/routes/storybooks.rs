//! Generation, chat and storybook lifecycle handlers.

use super::AppJson;
use crate::{AppError, AppState, CurrentUser};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use storybook_core::{FinalScript, Storybook, StorybookDetail};
use storybook_error::{ServiceError, StorybookError};
use storybook_generator::{ChatReply, CreateStorybook, GenerateStorybook, RewriteOutcome};
use storybook_interface::{Listing, StorybookSort};
use tracing::instrument;

/// Body of `POST /api/storybooks/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Current script
    pub script: FinalScript,
    /// User message
    pub message: String,
}

/// Body of `POST /api/storybooks/rewrite`.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteRequest {
    /// Script to rewrite
    pub script: FinalScript,
    /// What to change
    pub edit_request: String,
}

/// Body of `POST /api/storybooks/rewrite-text`.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteTextRequest {
    /// Passage to rewrite
    pub text: String,
    /// What to change
    pub edit_request: String,
}

/// Rewritten passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteTextResponse {
    /// New text
    pub text: String,
}

/// Query of `GET /api/storybooks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// 1-based page
    pub page: i64,
    /// Page size
    pub limit: i64,
    /// Ordering
    pub sort: StorybookSort,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort: StorybookSort::Latest,
        }
    }
}

/// Body of `PATCH /api/storybooks/:id/visibility`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityRequest {
    /// Whether anyone may read the storybook
    pub is_public: bool,
}

#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub(super) async fn generate(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<GenerateStorybook>,
) -> Result<(StatusCode, Json<StorybookDetail>), AppError> {
    let detail = state.services.generator.generate(&user.id, request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub(super) async fn chat(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state
        .services
        .chat
        .respond(&user.id, request.script, &request.message)
        .await?;
    Ok(Json(reply))
}

#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub(super) async fn rewrite(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<RewriteRequest>,
) -> Result<Json<RewriteOutcome>, AppError> {
    if request.script.user_id != user.id {
        let err: StorybookError = ServiceError::forbidden("script belongs to another user").into();
        return Err(err.into());
    }
    let outcome = state
        .services
        .chat
        .rewrite_full(&request.script, &request.edit_request, Some(&user.id))
        .await?;
    Ok(Json(outcome))
}

#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub(super) async fn rewrite_text(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<RewriteTextRequest>,
) -> Result<Json<RewriteTextResponse>, AppError> {
    let text = state
        .services
        .chat
        .rewrite_plain_text(&request.text, &request.edit_request, Some(&user.id))
        .await?;
    Ok(Json(RewriteTextResponse { text }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Listing<Storybook>>, AppError> {
    let listing = state
        .services
        .storybooks
        .list(&user.id, params.page, params.limit, params.sort)
        .await?;
    Ok(Json(listing))
}

#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub(super) async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<CreateStorybook>,
) -> Result<(StatusCode, Json<Storybook>), AppError> {
    let storybook = state.services.storybooks.create(&user.id, request).await?;
    Ok((StatusCode::CREATED, Json(storybook)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<StorybookDetail>, AppError> {
    Ok(Json(state.services.storybooks.get(&user.id, &id).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.services.storybooks.delete(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub(super) async fn set_visibility(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<VisibilityRequest>,
) -> Result<Json<Storybook>, AppError> {
    let storybook = state
        .services
        .storybooks
        .set_visibility(&user.id, &id, request.is_public)
        .await?;
    Ok(Json(storybook))
}
