//! Image prompt and illustration run tests.

mod test_utils;

use std::sync::Arc;
use storybook_core::{NewPage, NewStorybook, PagePatch, PipelineState, StoryBible};
use storybook_database::InMemoryStoryStore;
use storybook_error::{ErrorClass, StorybookResult};
use storybook_generator::{CharacterResolver, Illustrator, StageModels};
use storybook_interface::{PageRepository, StoryStore, StorybookRepository};
use test_utils::{MockImages, bible_json, character};

fn illustrator(store: &InMemoryStoryStore, images: &MockImages) -> Illustrator {
    let shared: Arc<dyn StoryStore> = Arc::new(store.clone());
    Illustrator::new(
        shared.clone(),
        Arc::new(images.clone()),
        CharacterResolver::new(shared),
        StageModels::default().image,
    )
}

async fn storybook(store: &InMemoryStoryStore, pages: Vec<NewPage>) -> StorybookResult<String> {
    let mut params = PipelineState::new("A dragon learns to share");
    params.style = Some("watercolor".to_string());
    params.bible = Some(serde_json::from_value::<StoryBible>(bible_json(&["Ember"])).unwrap());
    let storybook = store
        .create_storybook(
            NewStorybook::builder()
                .user_id("user-1")
                .creation_params(Some(params))
                .build()?,
        )
        .await?;
    store.insert_pages(&storybook.id, pages).await?;
    Ok(storybook.id)
}

fn page(number: i32, text: Option<&str>, prompt: Option<&str>) -> NewPage {
    NewPage {
        page_number: number,
        script_text: text.map(str::to_string),
        image_prompt: prompt.map(str::to_string),
        ..NewPage::default()
    }
}

#[tokio::test]
async fn test_prompts_are_written_for_pages_with_text() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    store.seed_character(character("c1", Some("user-1"), "Pip", false)).await;
    let mut first = page(1, Some("Pip waved."), None);
    first.character_ids = vec!["c1".to_string()];
    let id = storybook(
        &store,
        vec![
            first,
            page(2, Some("Ember hid."), None),
            page(3, None, None),
            page(4, Some("The end."), Some("keep me")),
        ],
    )
    .await?;

    let written = illustrator(&store, &MockImages::new())
        .generate_image_prompts("user-1", &id)
        .await?;
    assert_eq!(written, 2);

    let pages = store.list_pages(&id).await?;
    let first = pages[0].image_prompt.as_deref().unwrap();
    assert!(first.starts_with(
        "Create a fairy tale illustration for the following story script: Pip waved."
    ));
    assert!(first.contains("- Pip: Pip has round glasses"));
    assert!(first.ends_with("Style: watercolor"));
    assert_eq!(pages[0].image_style.as_deref(), Some("watercolor"));

    let second = pages[1].image_prompt.as_deref().unwrap();
    assert!(second.contains("- Ember: Ember wears a red scarf"));
    assert!(pages[2].image_prompt.is_none());
    assert_eq!(pages[3].image_prompt.as_deref(), Some("keep me"));
    Ok(())
}

#[tokio::test]
async fn test_missing_images_use_first_result_as_reference() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook(
        &store,
        vec![
            page(1, Some("a"), Some("prompt one")),
            page(2, Some("b"), Some("prompt two")),
            page(3, Some("c"), None),
            page(4, Some("d"), Some("prompt four")),
        ],
    )
    .await?;
    let images = MockImages::new().failing_on(format!("{}/2", id));

    let report = illustrator(&store, &images)
        .generate_missing_images("user-1", &id)
        .await?;

    assert_eq!(report.processed, 3);
    let succeeded: Vec<i32> = report.succeeded.iter().map(|p| p.page_number).collect();
    assert_eq!(succeeded, vec![1, 4]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].page_number, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].page_number, 3);

    let first_url = format!("http://cdn.test/media/{}/1.png", id);
    let requests = images.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].storage_path, format!("{}/1", id));
    assert_eq!(requests[0].reference_image_url, None);
    assert_eq!(requests[1].reference_image_url.as_deref(), Some(first_url.as_str()));
    assert_eq!(requests[2].reference_image_url.as_deref(), Some(first_url.as_str()));
    assert_eq!(requests[0].model.model, "gpt-image-1");

    let pages = store.list_pages(&id).await?;
    assert_eq!(pages[0].image_url.as_deref(), Some(first_url.as_str()));
    assert!(pages[1].image_url.is_none());
    Ok(())
}

#[tokio::test]
async fn test_existing_image_is_the_reference_and_is_skipped() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook(
        &store,
        vec![page(1, Some("a"), Some("one")), page(2, Some("b"), Some("two"))],
    )
    .await?;
    let patch = PagePatch {
        image_url: Some("http://cdn.test/media/cover.png".to_string()),
        ..PagePatch::default()
    };
    store.update_page(&id, 1, &patch).await?;
    let images = MockImages::new();

    let report = illustrator(&store, &images)
        .generate_missing_images("user-1", &id)
        .await?;

    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped[0].page_number, 1);
    assert_eq!(report.skipped[0].reason, "already illustrated");
    assert_eq!(
        images.requests()[0].reference_image_url.as_deref(),
        Some("http://cdn.test/media/cover.png")
    );
    Ok(())
}

#[tokio::test]
async fn test_illustration_is_owner_only() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook(&store, vec![page(1, Some("a"), Some("one"))]).await?;
    let images = MockImages::new();
    let illustrator = illustrator(&store, &images);

    let err = illustrator.generate_missing_images("user-2", &id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    let err = illustrator.generate_image_prompts("user-2", &id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    assert!(images.requests().is_empty());
    Ok(())
}
