//! Storybook, studio, character and explore service tests.

mod test_utils;

use std::sync::Arc;
use storybook_core::{CharacterPatch, NewCharacter, NewPage, PagePatch};
use storybook_database::InMemoryStoryStore;
use storybook_error::{ErrorClass, StorybookResult};
use storybook_generator::{
    CreateStorybook, ExploreQuery, NewPageContent, Services, StageModels,
};
use storybook_interface::{
    PageRepository, StoryStore, StorybookPatch, StorybookRepository, StorybookSort, UsageLedger,
};
use test_utils::{MockImages, MockOracle, RecordingUsage, character};

fn services(store: &InMemoryStoryStore) -> Services {
    let shared: Arc<dyn StoryStore> = Arc::new(store.clone());
    let ledger: Arc<dyn UsageLedger> = Arc::new(RecordingUsage::new());
    Services::new(
        shared,
        ledger,
        Arc::new(MockOracle::new()),
        Arc::new(MockImages::new()),
        StageModels::default(),
    )
}

async fn book_with_pages(
    services: &Services,
    store: &InMemoryStoryStore,
    user: &str,
    pages: i32,
) -> StorybookResult<String> {
    let storybook = services
        .storybooks
        .create(
            user,
            CreateStorybook {
                title: "  The Lantern Fox ".to_string(),
                ..CreateStorybook::default()
            },
        )
        .await?;
    let new_pages = (1..=pages)
        .map(|n| NewPage::with_text(n, format!("page {}", n)))
        .collect();
    store.insert_pages(&storybook.id, new_pages).await?;
    store
        .update_storybook(
            &storybook.id,
            &StorybookPatch {
                page_count: Some(pages),
                ..StorybookPatch::default()
            },
        )
        .await?;
    Ok(storybook.id)
}

#[tokio::test]
async fn test_deleting_page_three_of_five_renumbers() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    let id = book_with_pages(&services, &store, "user-1", 5).await?;

    let count = services.studio.delete_page("user-1", &id, 3).await?;
    assert_eq!(count, 4);

    let detail = services.storybooks.get("user-1", &id).await?;
    assert_eq!(detail.storybook.page_count, 4);
    let pages: Vec<(i32, &str)> = detail
        .pages
        .iter()
        .map(|p| (p.page_number, p.script_text.as_deref().unwrap_or_default()))
        .collect();
    assert_eq!(
        pages,
        vec![(1, "page 1"), (2, "page 2"), (3, "page 4"), (4, "page 5")]
    );
    Ok(())
}

#[tokio::test]
async fn test_studio_requires_ownership() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    let id = book_with_pages(&services, &store, "user-1", 2).await?;

    let err = services.studio.get_title("user-2", &id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    let err = services.studio.delete_page("user-2", &id, 1).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    let err = services.studio.get_title("user-1", "missing").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);

    assert_eq!(store.list_pages(&id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_title_and_page_editing() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    let id = book_with_pages(&services, &store, "user-1", 2).await?;

    assert_eq!(services.studio.get_title("user-1", &id).await?, "The Lantern Fox");
    let err = services.studio.update_title("user-1", &id, "   ").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Client);
    let renamed = services.studio.update_title("user-1", &id, " Fox at Dusk ").await?;
    assert_eq!(renamed.title, "Fox at Dusk");

    let err = services
        .studio
        .update_page("user-1", &id, 1, &PagePatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Client);

    let patch = PagePatch {
        background_description: Some("a moonlit meadow".to_string()),
        ..PagePatch::default()
    };
    let page = services.studio.update_page("user-1", &id, 2, &patch).await?;
    assert_eq!(page.background_description.as_deref(), Some("a moonlit meadow"));
    assert_eq!(page.script_text.as_deref(), Some("page 2"));

    let added = services
        .studio
        .add_page(
            "user-1",
            &id,
            NewPageContent {
                script_text: Some("The end.".to_string()),
                ..NewPageContent::default()
            },
        )
        .await?;
    assert_eq!(added.page_number, 3);
    assert_eq!(services.studio.get_page("user-1", &id, 3).await?.script_text.as_deref(), Some("The end."));
    let err = services.studio.get_page("user-1", &id, 9).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_private_storybooks_are_hidden_until_published() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    let id = book_with_pages(&services, &store, "user-1", 1).await?;

    let err = services.storybooks.get("user-2", &id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    let err = services.storybooks.set_visibility("user-2", &id, true).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);

    services.storybooks.set_visibility("user-1", &id, true).await?;
    let detail = services.storybooks.get("user-2", &id).await?;
    assert_eq!(detail.pages.len(), 1);

    let err = services.storybooks.delete("user-2", &id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    services.storybooks.delete("user-1", &id).await?;
    let err = services.storybooks.get("user-1", &id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_listing_is_per_owner_and_clamped() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    for _ in 0..3 {
        services.storybooks.create("user-1", CreateStorybook::default()).await?;
    }
    services.storybooks.create("user-2", CreateStorybook::default()).await?;

    let listing = services.storybooks.list("user-1", 1, 0, StorybookSort::Latest).await?;
    assert_eq!(listing.total, 3);
    assert_eq!(listing.items.len(), 1);
    let listing = services.storybooks.list("user-1", 1, 500, StorybookSort::Popular).await?;
    assert_eq!(listing.items.len(), 3);
    assert!(listing.items.iter().all(|s| s.user_id == "user-1"));
    Ok(())
}

#[tokio::test]
async fn test_presets_are_read_only() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    store.seed_character(character("preset-1", None, "Owl", true)).await;
    store.seed_character(character("mine", Some("user-1"), "Pip", false)).await;

    assert_eq!(services.characters.get("user-2", "preset-1").await?.character_name, "Owl");
    let patch = CharacterPatch {
        description: Some("grumpy".to_string()),
        ..CharacterPatch::default()
    };
    let err = services.characters.update("user-1", "preset-1", &patch).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    assert!(err.to_string().contains("cannot modify preset characters"));
    let err = services.characters.delete("user-1", "preset-1").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);

    let err = services.characters.get("user-2", "mine").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);
    let err = services.characters.update("user-2", "mine", &patch).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Forbidden);

    let updated = services.characters.update("user-1", "mine", &patch).await?;
    assert_eq!(updated.description.as_deref(), Some("grumpy"));
    Ok(())
}

#[tokio::test]
async fn test_character_lifecycle() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    store.seed_preset("Owl", "round spectacles").await;

    let err = services
        .characters
        .create("user-1", NewCharacter::builder().character_name("  ").visual_features("tall").build()?)
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Client);

    let fox = services
        .characters
        .create(
            "user-1",
            NewCharacter::builder()
                .character_name("Fox")
                .visual_features("orange fur, lantern")
                .build()?,
        )
        .await?;
    assert!(!fox.is_preset);
    assert_eq!(fox.user_id.as_deref(), Some("user-1"));

    let names: Vec<String> = services
        .characters
        .list("user-1", true)
        .await?
        .into_iter()
        .map(|c| c.character_name)
        .collect();
    assert_eq!(names, vec!["Fox", "Owl"]);
    assert_eq!(services.characters.list("user-1", false).await?.len(), 1);
    assert_eq!(services.characters.presets().await?.len(), 1);

    services.characters.delete("user-1", &fox.id).await?;
    let err = services.characters.get("user-1", &fox.id).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_explore_lists_public_storybooks() -> StorybookResult<()> {
    let store = InMemoryStoryStore::new();
    let services = services(&store);
    for (title, category, public) in [
        ("Dragon Friends", Some("Friendship"), true),
        ("Dragon Nap", Some("Bedtime Stories"), true),
        ("Secret Dragon", Some("Friendship"), false),
        ("Moon Fox", Some("Bedtime Stories"), true),
    ] {
        services
            .storybooks
            .create(
                "author-1",
                CreateStorybook {
                    title: title.to_string(),
                    category: category.map(str::to_string),
                    tags: vec!["dragons".to_string()],
                    is_public: public,
                },
            )
            .await?;
    }

    let page = services
        .explore
        .explore(ExploreQuery {
            q: Some("DRAGON".to_string()),
            limit: 1,
            ..ExploreQuery::default()
        })
        .await?;
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.stories.len(), 1);
    assert!(page.pagination.has_next);
    assert!(!page.pagination.has_prev);
    assert_eq!(page.stories[0].author.id, "author-1");

    let page = services
        .explore
        .explore(ExploreQuery {
            category: Some("Bedtime Stories".to_string()),
            page: 2,
            limit: 1,
            ..ExploreQuery::default()
        })
        .await?;
    assert_eq!(page.pagination.total, 2);
    assert!(!page.pagination.has_next);
    assert!(page.pagination.has_prev);

    let page = services
        .explore
        .explore(ExploreQuery {
            page: i64::MAX,
            limit: 100,
            ..ExploreQuery::default()
        })
        .await?;
    assert!(page.stories.is_empty());
    assert_eq!(page.pagination.total, 3);
    assert!(!page.pagination.has_next);

    let categories = services.explore.categories().await?;
    let summary: Vec<(&str, &str, i64)> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str(), c.count))
        .collect();
    assert_eq!(
        summary,
        vec![("bedtime-stories", "Bedtime Stories", 2), ("friendship", "Friendship", 1)]
    );
    Ok(())
}
