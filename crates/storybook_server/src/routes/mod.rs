//! HTTP routes.
//!
//! Every route except `/health` requires a bearer token; handlers take a
//! [`CurrentUser`](crate::CurrentUser) and pass its id to the services,
//! which do their own ownership checks.

mod characters;
mod explore;
mod storybooks;
mod studio;

pub use storybooks::{
    ChatRequest, ListParams, RewriteRequest, RewriteTextRequest, RewriteTextResponse,
    VisibilityRequest,
};
pub use studio::{ImagePromptsResponse, PageCountResponse, TitleBody};
pub use characters::CharacterListParams;
pub use explore::ExploreParams;

use crate::{AppError, AppState};
use axum::extract::FromRequest;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// JSON body extractor whose rejections render like every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/storybooks/generate", post(storybooks::generate))
        .route("/api/storybooks/chat", post(storybooks::chat))
        .route("/api/storybooks/rewrite", post(storybooks::rewrite))
        .route("/api/storybooks/rewrite-text", post(storybooks::rewrite_text))
        .route(
            "/api/storybooks",
            get(storybooks::list).post(storybooks::create),
        )
        .route(
            "/api/storybooks/:id",
            get(storybooks::get).delete(storybooks::delete),
        )
        .route(
            "/api/storybooks/:id/visibility",
            patch(storybooks::set_visibility),
        )
        .route(
            "/api/studio/:id/title",
            get(studio::get_title).patch(studio::update_title),
        )
        .route("/api/studio/:id/pages", post(studio::add_page))
        .route(
            "/api/studio/:id/pages/:page_number",
            get(studio::get_page)
                .patch(studio::update_page)
                .delete(studio::delete_page),
        )
        .route("/api/studio/:id/image-prompts", post(studio::image_prompts))
        .route("/api/studio/:id/images", post(studio::images))
        .route(
            "/api/characters",
            get(characters::list).post(characters::create),
        )
        .route("/api/characters/presets", get(characters::presets))
        .route(
            "/api/characters/:id",
            get(characters::get)
                .patch(characters::update)
                .delete(characters::delete),
        )
        .route("/api/explore", get(explore::explore))
        .route("/api/explore/categories", get(explore::categories))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
