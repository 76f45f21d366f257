use storybook_core::{
    NewCharacter, NewPage, NewStorybook, PagePatch, PipelineState, StorybookStatus,
};
use storybook_database::InMemoryStoryStore;
use storybook_error::{ErrorClass, StorybookResult};
use storybook_interface::{
    CharacterRepository, PageRepository, StorybookFilter, StorybookPatch, StorybookRepository,
    StorybookSort, UsageLedger,
};

async fn storybook_with_pages(store: &InMemoryStoryStore, count: i32) -> StorybookResult<String> {
    let storybook = store
        .create_storybook(
            NewStorybook::builder()
                .user_id("user-1")
                .title("The Lantern Fox")
                .page_count(count)
                .build()?,
        )
        .await?;
    let pages = (1..=count)
        .map(|n| NewPage::with_text(n, format!("page {}", n)))
        .collect();
    store.insert_pages(&storybook.id, pages).await?;
    Ok(storybook.id)
}

#[tokio::test]
async fn test_delete_page_renumbers_densely() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook_with_pages(&store, 4).await?;

    let remaining = store.delete_page(&id, 2).await?;
    assert_eq!(remaining, 3);

    let pages = store.list_pages(&id).await?;
    let numbers: Vec<i32> = pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    let texts: Vec<&str> = pages.iter().filter_map(|p| p.script_text.as_deref()).collect();
    assert_eq!(texts, vec!["page 1", "page 3", "page 4"]);

    let storybook = store.get_storybook(&id).await?.expect("storybook exists");
    assert_eq!(storybook.page_count, 3);
    Ok(())
}

#[tokio::test]
async fn test_delete_missing_page_is_not_found() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook_with_pages(&store, 2).await?;

    let err = store.delete_page(&id, 5).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    assert_eq!(store.list_pages(&id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_append_page_uses_next_number() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook_with_pages(&store, 2).await?;

    let page = store.append_page(&id, NewPage::with_text(99, "the end")).await?;
    assert_eq!(page.page_number, 3);
    assert_eq!(store.get_storybook(&id).await?.expect("exists").page_count, 3);
    Ok(())
}

#[tokio::test]
async fn test_bulk_insert_is_all_or_nothing() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook_with_pages(&store, 2).await?;

    let err = store
        .insert_pages(
            &id,
            vec![NewPage::with_text(3, "new"), NewPage::with_text(2, "duplicate")],
        )
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(store.list_pages(&id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_creation_params_version_check() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook_with_pages(&store, 0).await?;
    let params = PipelineState::new("a fox who is afraid of the dark");

    let updated = store.update_creation_params(&id, 0, &params).await?;
    assert_eq!(updated.params_version, 1);
    assert_eq!(updated.creation_params, Some(params.clone()));

    let err = store
        .update_creation_params(&id, 0, &params)
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);

    let err = store
        .update_creation_params("missing", 0, &params)
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_update_page_applies_patch() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let id = storybook_with_pages(&store, 2).await?;

    let patch = PagePatch {
        image_url: Some("https://cdn.example/p1.png".to_string()),
        ..Default::default()
    };
    let page = store.update_page(&id, 1, &patch).await?;
    assert_eq!(page.image_url.as_deref(), Some("https://cdn.example/p1.png"));
    assert_eq!(page.script_text.as_deref(), Some("page 1"));
    Ok(())
}

#[tokio::test]
async fn test_get_characters_preserves_request_order() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let owl = store.seed_preset("Owl", "grey feathers").await;
    let fox = store
        .create_character(
            "user-1",
            NewCharacter::builder()
                .character_name("Fox")
                .visual_features("orange coat")
                .build()?,
        )
        .await?;

    let ids = vec![fox.id.clone(), "missing".to_string(), owl.id.clone()];
    let names: Vec<String> = store
        .get_characters(&ids)
        .await?
        .into_iter()
        .map(|c| c.character_name)
        .collect();
    assert_eq!(names, vec!["Fox", "Owl"]);

    let repeated = vec![owl.id.clone(), fox.id.clone(), owl.id.clone(), fox.id.clone()];
    let names: Vec<String> = store
        .get_characters(&repeated)
        .await?
        .into_iter()
        .map(|c| c.character_name)
        .collect();
    assert_eq!(names, vec!["Owl", "Fox"]);

    let listed = store.list_characters("user-1", true).await?;
    assert_eq!(listed.len(), 2);
    assert!(!listed[0].is_preset);
    assert!(listed[1].is_preset);
    assert_eq!(store.list_characters("user-1", false).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_list_filters_and_sorting() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    for (title, public, category) in [
        ("Moon Garden", true, "bedtime"),
        ("Sun Parade", true, "adventure"),
        ("Moon Boat", false, "bedtime"),
    ] {
        let storybook = store
            .create_storybook(
                NewStorybook::builder()
                    .user_id("user-1")
                    .title(title)
                    .is_public(public)
                    .category(Some(category.to_string()))
                    .status(StorybookStatus::Complete)
                    .build()?,
            )
            .await?;
        if title == "Sun Parade" {
            store
                .update_storybook(
                    &storybook.id,
                    &StorybookPatch {
                        title: Some("Sun Parade!".to_string()),
                        ..Default::default()
                    },
                )
                .await?;
        }
    }

    let mut filter = StorybookFilter::public();
    filter.title_query = Some("moon".to_string());
    let listing = store.list_storybooks(&filter).await?;
    assert_eq!(listing.total, 1);
    assert_eq!(listing.items[0].title, "Moon Garden");

    let listing = store
        .list_storybooks(&StorybookFilter::owned_by("user-1").with_sort(StorybookSort::Latest).with_page(1, 2))
        .await?;
    assert_eq!(listing.total, 3);
    assert_eq!(listing.items.len(), 2);

    let counts = store.category_counts().await?;
    assert_eq!(counts.len(), 2);
    assert!(counts.iter().all(|c| c.count == 1));
    Ok(())
}

#[tokio::test]
async fn test_credits_accumulate() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    store.increment_credits_used("user-1", 120).await?;
    store.increment_credits_used("user-1", 30).await?;
    assert_eq!(store.credits_used("user-1").await, 150);
    assert_eq!(store.credits_used("user-2").await, 0);
    Ok(())
}
