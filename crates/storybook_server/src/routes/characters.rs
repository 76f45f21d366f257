//! Character handlers.

use super::AppJson;
use crate::{AppError, AppState, CurrentUser};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use storybook_core::{Character, CharacterPatch, NewCharacter};
use tracing::instrument;

/// Query of `GET /api/characters`.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterListParams {
    /// Include system presets after the caller's own characters
    #[serde(default = "include_presets_default")]
    pub include_presets: bool,
}

fn include_presets_default() -> bool {
    true
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<CharacterListParams>,
) -> Result<Json<Vec<Character>>, AppError> {
    let characters = state
        .services
        .characters
        .list(&user.id, params.include_presets)
        .await?;
    Ok(Json(characters))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn presets(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Character>>, AppError> {
    Ok(Json(state.services.characters.presets().await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Character>, AppError> {
    Ok(Json(state.services.characters.get(&user.id, &id).await?))
}

#[instrument(skip(state, user, new), fields(user_id = %user.id))]
pub(super) async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(new): AppJson<NewCharacter>,
) -> Result<(StatusCode, Json<Character>), AppError> {
    let character = state.services.characters.create(&user.id, new).await?;
    Ok((StatusCode::CREATED, Json(character)))
}

#[instrument(skip(state, user, patch), fields(user_id = %user.id))]
pub(super) async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(patch): AppJson<CharacterPatch>,
) -> Result<Json<Character>, AppError> {
    let character = state
        .services
        .characters
        .update(&user.id, &id, &patch)
        .await?;
    Ok(Json(character))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(super) async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.services.characters.delete(&user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
