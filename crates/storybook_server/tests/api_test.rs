//! End-to-end HTTP tests over the in-memory store.

mod test_utils;

use axum::http::StatusCode;
use serde_json::json;
use storybook_database::InMemoryStoryStore;
use storybook_interface::StorybookRepository;
use storybook_core::NewStorybook;
use test_utils::{ScriptedOracle, app, arc_json, bible_json, script_json, send};

async fn seeded_storybook(store: &InMemoryStoryStore, owner: &str, public: bool) -> String {
    store
        .create_storybook(
            NewStorybook::builder()
                .user_id(owner)
                .title("Ember's Day")
                .is_public(public)
                .category(Some("Bedtime Stories".to_string()))
                .build()
                .unwrap(),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = app(&InMemoryStoryStore::new(), &ScriptedOracle::default());
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = app(&InMemoryStoryStore::new(), &ScriptedOracle::default());

    let (status, body) = send(&app, "GET", "/api/storybooks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["class"], "unauthorized");

    let request = axum::http::Request::builder()
        .uri("/api/characters")
        .header("authorization", "Bearer forged")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_generate_creates_storybook_with_28_pages() {
    let store = InMemoryStoryStore::new();
    let oracle = ScriptedOracle::default()
        .with_structured("story_bible", bible_json())
        .with_structured("story_arc", arc_json())
        .with_structured("final_script", script_json("ignored", "ignored"));
    let app = app(&store, &oracle);

    let (status, body) = send(
        &app,
        "POST",
        "/api/storybooks/generate",
        Some("alice"),
        Some(json!({ "prompt": "A shy dragon makes a friend", "title": "Ember" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["storybook"]["user_id"], "alice");
    assert_eq!(body["storybook"]["page_count"], 28);
    assert_eq!(body["pages"].as_array().unwrap().len(), 28);
    assert_eq!(body["pages"][0]["page_number"], 1);
    assert_eq!(store.credits_used("alice").await, 45);
}

#[tokio::test]
async fn test_generate_blank_prompt_is_client_error() {
    let store = InMemoryStoryStore::new();
    let oracle = ScriptedOracle::default();
    let app = app(&store, &oracle);

    let (status, body) = send(
        &app,
        "POST",
        "/api/storybooks/generate",
        Some("alice"),
        Some(json!({ "prompt": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["class"], "client");
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_renders_error_envelope() {
    let app = app(&InMemoryStoryStore::new(), &ScriptedOracle::default());
    let (status, body) = send(
        &app,
        "POST",
        "/api/storybooks/chat",
        Some("alice"),
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert!(status.is_client_error());
    assert_eq!(body["error"]["class"], "client");
    assert!(body["error"]["message"].as_str().unwrap().starts_with("body:"));
}

#[tokio::test]
async fn test_chat_rejects_foreign_script() {
    let oracle = ScriptedOracle::default();
    let app = app(&InMemoryStoryStore::new(), &oracle);

    let (status, body) = send(
        &app,
        "POST",
        "/api/storybooks/chat",
        Some("mallory"),
        Some(json!({ "script": script_json("sb-1", "alice"), "message": "Make it sadder" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["class"], "forbidden");
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_chat_question_is_answered() {
    let oracle = ScriptedOracle::default()
        .with_structured("classification", json!({ "action": "question" }))
        .with_text("  Ember is a shy dragon.  ");
    let app = app(&InMemoryStoryStore::new(), &oracle);

    let (status, body) = send(
        &app,
        "POST",
        "/api/storybooks/chat",
        Some("alice"),
        Some(json!({ "script": script_json("sb-1", "alice"), "message": "Who is Ember?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "question");
    assert_eq!(body["assistant_message"], "Ember is a shy dragon.");
    assert!(body.get("script").is_none());
}

#[tokio::test]
async fn test_rewrite_pins_identifiers() {
    let mut rewritten = script_json("other-book", "other-user");
    rewritten["change_summary"] = json!("Made every spread gentler");
    let oracle = ScriptedOracle::default().with_structured("final_rewrite", rewritten);
    let app = app(&InMemoryStoryStore::new(), &oracle);

    let (status, body) = send(
        &app,
        "POST",
        "/api/storybooks/rewrite",
        Some("alice"),
        Some(json!({ "script": script_json("sb-1", "alice"), "edit_request": "gentler" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["script"]["storybook_id"], "sb-1");
    assert_eq!(body["script"]["user_id"], "alice");
    assert_eq!(body["change_summary"], "Made every spread gentler");
}

#[tokio::test]
async fn test_private_storybook_is_forbidden_to_others() {
    let store = InMemoryStoryStore::new();
    let id = seeded_storybook(&store, "alice", false).await;
    let app = app(&store, &ScriptedOracle::default());

    let (status, _) = send(&app, "GET", &format!("/api/storybooks/{}", id), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/storybooks/{}", id), Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["class"], "forbidden");

    let (status, body) = send(&app, "GET", "/api/storybooks/missing", Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["class"], "not_found");
}

#[tokio::test]
async fn test_studio_page_lifecycle_keeps_numbering_dense() {
    let store = InMemoryStoryStore::new();
    let id = seeded_storybook(&store, "alice", false).await;
    let app = app(&store, &ScriptedOracle::default());

    for n in 1..=3 {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/studio/{}/pages", id),
            Some("alice"),
            Some(json!({ "script_text": format!("Page {}", n) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["page_number"], n);
    }

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/studio/{}/pages/2", id),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page_count"], 2);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/studio/{}/pages/2", id),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["script_text"], "Page 3");

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/studio/{}/pages/1", id),
        Some("bob"),
        Some(json!({ "script_text": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_studio_title_round_trip() {
    let store = InMemoryStoryStore::new();
    let id = seeded_storybook(&store, "alice", false).await;
    let app = app(&store, &ScriptedOracle::default());

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/studio/{}/title", id),
        Some("alice"),
        Some(json!({ "title": "  Ember Finds a Friend " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/api/studio/{}/title", id), Some("alice"), None).await;
    assert_eq!(body["title"], "Ember Finds a Friend");

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/studio/{}/title", id),
        Some("alice"),
        Some(json!({ "title": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_images_are_generated_for_prompted_pages() {
    let store = InMemoryStoryStore::new();
    let id = seeded_storybook(&store, "alice", false).await;
    let app = app(&store, &ScriptedOracle::default());

    for text in ["Ember wakes up", "Ember flies"] {
        send(
            &app,
            "POST",
            &format!("/api/studio/{}/pages", id),
            Some("alice"),
            Some(json!({ "script_text": text })),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/studio/{}/image-prompts", id),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["written"], 2);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/studio/{}/images", id),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], 2);
    assert_eq!(body["succeeded"].as_array().unwrap().len(), 2);

    let (_, page) = send(&app, "GET", &format!("/api/studio/{}/pages/1", id), Some("alice"), None).await;
    assert_eq!(page["image_url"], format!("http://cdn.test/{}/1.png", id));
}

#[tokio::test]
async fn test_presets_cannot_be_edited() {
    let store = InMemoryStoryStore::new();
    let preset = store.seed_preset("Luna", "silver fur").await;
    let app = app(&store, &ScriptedOracle::default());

    let (status, body) = send(&app, "GET", "/api/characters/presets", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["character_name"], "Luna");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/characters/{}", preset.id),
        Some("alice"),
        Some(json!({ "visual_features": "gold fur" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["class"], "forbidden");
}

#[tokio::test]
async fn test_character_crud() {
    let store = InMemoryStoryStore::new();
    let app = app(&store, &ScriptedOracle::default());

    let (status, created) = send(
        &app,
        "POST",
        "/api/characters",
        Some("alice"),
        Some(json!({ "character_name": "Pip", "visual_features": "tiny mouse, blue hat" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/characters/{}", id),
        Some("alice"),
        Some(json!({ "description": "A brave mouse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "A brave mouse");

    let (_, listed) = send(&app, "GET", "/api/characters?include_presets=false", Some("alice"), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/characters/{}", id), Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &format!("/api/characters/{}", id), Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_explore_lists_only_public_storybooks() {
    let store = InMemoryStoryStore::new();
    seeded_storybook(&store, "alice", true).await;
    seeded_storybook(&store, "bob", false).await;
    let app = app(&store, &ScriptedOracle::default());

    let (status, body) = send(&app, "GET", "/api/explore?page=1&limit=10", Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stories"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["has_next"], false);

    let (status, body) = send(&app, "GET", "/api/explore/categories", Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "bedtime-stories");
    assert_eq!(body[0]["count"], 1);
}

#[tokio::test]
async fn test_visibility_is_owner_only() {
    let store = InMemoryStoryStore::new();
    let id = seeded_storybook(&store, "alice", false).await;
    let app = app(&store, &ScriptedOracle::default());

    let uri = format!("/api/storybooks/{}/visibility", id);
    let (status, _) = send(&app, "PATCH", &uri, Some("bob"), Some(json!({ "is_public": true }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PATCH", &uri, Some("alice"), Some(json!({ "is_public": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_public"], true);

    let (status, _) = send(&app, "GET", &format!("/api/storybooks/{}", id), Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
}
