//! In-memory record store for tests and local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storybook_core::{
    Character, CharacterPatch, NewCharacter, NewPage, NewStorybook, Page, PagePatch,
    PipelineState, Storybook,
};
use storybook_error::{DatabaseError, DatabaseErrorKind, StorybookResult};
use storybook_interface::{
    CategoryCount, CharacterRepository, Listing, PageRepository, StorybookFilter,
    StorybookPatch, StorybookRepository, StorybookSort, UsageLedger,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    storybooks: HashMap<String, Storybook>,
    /// Pages per storybook, kept sorted by page number.
    pages: HashMap<String, Vec<Page>>,
    characters: HashMap<String, Character>,
    credits: HashMap<String, i64>,
}

/// Record store held in process memory.
///
/// Mirrors the PostgreSQL store's semantics: version-checked
/// `creation_params` writes, all-or-nothing page inserts and dense page
/// renumbering on delete. Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoryStore {
    state: Arc<RwLock<State>>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn not_found(what: String) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::NotFound(what))
}

impl InMemoryStoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user-owned character as-is.
    pub async fn seed_character(&self, character: Character) {
        self.state
            .write()
            .await
            .characters
            .insert(character.id.clone(), character);
    }

    /// Insert a system preset character and return it.
    pub async fn seed_preset(
        &self,
        name: impl Into<String>,
        visual_features: impl Into<String>,
    ) -> Character {
        let now = Utc::now();
        let character = Character {
            id: new_id(),
            user_id: None,
            character_name: name.into(),
            description: None,
            visual_features: visual_features.into(),
            image_url: None,
            personality_traits: Vec::new(),
            likes: Vec::new(),
            additional_info: serde_json::Value::Object(Default::default()),
            is_preset: true,
            created_at: now,
            updated_at: now,
        };
        self.seed_character(character.clone()).await;
        character
    }

    /// Tokens billed to `user_id` so far.
    pub async fn credits_used(&self, user_id: &str) -> i64 {
        self.state
            .read()
            .await
            .credits
            .get(user_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl StorybookRepository for InMemoryStoryStore {
    async fn create_storybook(&self, new: NewStorybook) -> StorybookResult<Storybook> {
        let now = Utc::now();
        let storybook = Storybook {
            id: new_id(),
            user_id: new.user_id,
            title: new.title,
            cover_image_url: None,
            status: new.status,
            is_public: new.is_public,
            page_count: new.page_count,
            like_count: 0,
            view_count: 0,
            category: new.category,
            tags: new.tags,
            character_ids: new.character_ids,
            creation_params: new.creation_params,
            params_version: 0,
            created_at: now,
            updated_at: now,
        };
        self.state
            .write()
            .await
            .storybooks
            .insert(storybook.id.clone(), storybook.clone());
        Ok(storybook)
    }

    async fn get_storybook(&self, id: &str) -> StorybookResult<Option<Storybook>> {
        Ok(self.state.read().await.storybooks.get(id).cloned())
    }

    async fn update_creation_params(
        &self,
        id: &str,
        expected_version: i64,
        params: &PipelineState,
    ) -> StorybookResult<Storybook> {
        let mut state = self.state.write().await;
        let storybook = state
            .storybooks
            .get_mut(id)
            .ok_or_else(|| not_found(format!("storybook {}", id)))?;
        if storybook.params_version != expected_version {
            return Err(DatabaseError::new(DatabaseErrorKind::Conflict(format!(
                "creation_params of storybook {} changed since version {}",
                id, expected_version
            )))
            .into());
        }
        storybook.creation_params = Some(params.clone());
        storybook.params_version += 1;
        storybook.updated_at = Utc::now();
        Ok(storybook.clone())
    }

    async fn update_storybook(
        &self,
        id: &str,
        patch: &StorybookPatch,
    ) -> StorybookResult<Storybook> {
        let mut state = self.state.write().await;
        let storybook = state
            .storybooks
            .get_mut(id)
            .ok_or_else(|| not_found(format!("storybook {}", id)))?;
        patch.apply(storybook);
        storybook.updated_at = Utc::now();
        Ok(storybook.clone())
    }

    async fn delete_storybook(&self, id: &str) -> StorybookResult<bool> {
        let mut state = self.state.write().await;
        state.pages.remove(id);
        Ok(state.storybooks.remove(id).is_some())
    }

    async fn list_storybooks(
        &self,
        filter: &StorybookFilter,
    ) -> StorybookResult<Listing<Storybook>> {
        let state = self.state.read().await;
        let mut matches: Vec<Storybook> = state
            .storybooks
            .values()
            .filter(|storybook| filter.matches(storybook))
            .cloned()
            .collect();
        match filter.sort {
            StorybookSort::Latest => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            StorybookSort::Popular => matches.sort_by(|a, b| {
                b.like_count
                    .cmp(&a.like_count)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
            StorybookSort::Viewed => matches.sort_by(|a, b| {
                b.view_count
                    .cmp(&a.view_count)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }
        let total = matches.len() as i64;
        let items = matches
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok(Listing { items, total })
    }

    async fn category_counts(&self) -> StorybookResult<Vec<CategoryCount>> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for storybook in state.storybooks.values().filter(|s| s.is_public) {
            if let Some(category) = &storybook.category {
                *counts.entry(category.as_str()).or_default() += 1;
            }
        }
        let mut counts: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        Ok(counts)
    }
}

#[async_trait]
impl PageRepository for InMemoryStoryStore {
    async fn insert_pages(
        &self,
        storybook_id: &str,
        pages: Vec<NewPage>,
    ) -> StorybookResult<Vec<Page>> {
        let mut state = self.state.write().await;
        if !state.storybooks.contains_key(storybook_id) {
            return Err(not_found(format!("storybook {}", storybook_id)).into());
        }

        let existing = state.pages.entry(storybook_id.to_string()).or_default();
        let mut seen: Vec<i32> = existing.iter().map(|p| p.page_number).collect();
        for page in &pages {
            if seen.contains(&page.page_number) {
                return Err(DatabaseError::new(DatabaseErrorKind::Conflict(format!(
                    "page {} of storybook {} already exists",
                    page.page_number, storybook_id
                )))
                .into());
            }
            seen.push(page.page_number);
        }

        let now = Utc::now();
        let mut inserted: Vec<Page> = pages
            .into_iter()
            .map(|page| Page {
                id: new_id(),
                storybook_id: storybook_id.to_string(),
                page_number: page.page_number,
                script_text: page.script_text,
                image_url: None,
                audio_url: None,
                image_prompt: page.image_prompt,
                image_style: page.image_style,
                character_ids: page.character_ids,
                background_description: page.background_description,
                created_at: now,
            })
            .collect();
        inserted.sort_by_key(|page| page.page_number);
        existing.extend(inserted.iter().cloned());
        existing.sort_by_key(|page| page.page_number);
        Ok(inserted)
    }

    async fn list_pages(&self, storybook_id: &str) -> StorybookResult<Vec<Page>> {
        Ok(self
            .state
            .read()
            .await
            .pages
            .get(storybook_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_page(&self, storybook_id: &str, page_number: i32) -> StorybookResult<Option<Page>> {
        Ok(self
            .state
            .read()
            .await
            .pages
            .get(storybook_id)
            .and_then(|pages| pages.iter().find(|p| p.page_number == page_number))
            .cloned())
    }

    async fn update_page(
        &self,
        storybook_id: &str,
        page_number: i32,
        patch: &PagePatch,
    ) -> StorybookResult<Page> {
        let mut state = self.state.write().await;
        let page = state
            .pages
            .get_mut(storybook_id)
            .and_then(|pages| pages.iter_mut().find(|p| p.page_number == page_number))
            .ok_or_else(|| not_found(format!("page {} of storybook {}", page_number, storybook_id)))?;
        patch.apply(page);
        Ok(page.clone())
    }

    async fn append_page(&self, storybook_id: &str, page: NewPage) -> StorybookResult<Page> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let storybook = state
            .storybooks
            .get_mut(storybook_id)
            .ok_or_else(|| not_found(format!("storybook {}", storybook_id)))?;
        storybook.page_count += 1;
        storybook.updated_at = Utc::now();

        let appended = Page {
            id: new_id(),
            storybook_id: storybook_id.to_string(),
            page_number: storybook.page_count,
            script_text: page.script_text,
            image_url: None,
            audio_url: None,
            image_prompt: page.image_prompt,
            image_style: page.image_style,
            character_ids: page.character_ids,
            background_description: page.background_description,
            created_at: Utc::now(),
        };
        let pages = state.pages.entry(storybook_id.to_string()).or_default();
        pages.push(appended.clone());
        pages.sort_by_key(|p| p.page_number);
        Ok(appended)
    }

    async fn delete_page(&self, storybook_id: &str, page_number: i32) -> StorybookResult<i32> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let storybook = state
            .storybooks
            .get_mut(storybook_id)
            .ok_or_else(|| not_found(format!("storybook {}", storybook_id)))?;
        let pages = state
            .pages
            .get_mut(storybook_id)
            .ok_or_else(|| not_found(format!("page {} of storybook {}", page_number, storybook_id)))?;
        let position = pages
            .iter()
            .position(|p| p.page_number == page_number)
            .ok_or_else(|| not_found(format!("page {} of storybook {}", page_number, storybook_id)))?;

        pages.remove(position);
        for page in pages.iter_mut().filter(|p| p.page_number > page_number) {
            page.page_number -= 1;
        }
        storybook.page_count = (storybook.page_count - 1).max(0);
        storybook.updated_at = Utc::now();
        Ok(storybook.page_count)
    }
}

#[async_trait]
impl CharacterRepository for InMemoryStoryStore {
    async fn get_characters(&self, ids: &[String]) -> StorybookResult<Vec<Character>> {
        let state = self.state.read().await;
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| state.characters.get(id))
            .cloned()
            .collect())
    }

    async fn get_character(&self, id: &str) -> StorybookResult<Option<Character>> {
        Ok(self.state.read().await.characters.get(id).cloned())
    }

    async fn list_characters(
        &self,
        user_id: &str,
        include_presets: bool,
    ) -> StorybookResult<Vec<Character>> {
        let state = self.state.read().await;
        let mut own: Vec<Character> = state
            .characters
            .values()
            .filter(|c| !c.is_preset && c.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if include_presets {
            let mut presets: Vec<Character> =
                state.characters.values().filter(|c| c.is_preset).cloned().collect();
            presets.sort_by(|a, b| a.character_name.cmp(&b.character_name));
            own.extend(presets);
        }
        Ok(own)
    }

    async fn list_presets(&self) -> StorybookResult<Vec<Character>> {
        let state = self.state.read().await;
        let mut presets: Vec<Character> =
            state.characters.values().filter(|c| c.is_preset).cloned().collect();
        presets.sort_by(|a, b| a.character_name.cmp(&b.character_name));
        Ok(presets)
    }

    async fn create_character(
        &self,
        user_id: &str,
        new: NewCharacter,
    ) -> StorybookResult<Character> {
        let now = Utc::now();
        let character = Character {
            id: new_id(),
            user_id: Some(user_id.to_string()),
            character_name: new.character_name,
            description: new.description,
            visual_features: new.visual_features,
            image_url: new.image_url,
            personality_traits: new.personality_traits,
            likes: new.likes,
            additional_info: if new.additional_info.is_null() {
                serde_json::Value::Object(Default::default())
            } else {
                new.additional_info
            },
            is_preset: false,
            created_at: now,
            updated_at: now,
        };
        self.seed_character(character.clone()).await;
        Ok(character)
    }

    async fn update_character(
        &self,
        id: &str,
        patch: &CharacterPatch,
    ) -> StorybookResult<Character> {
        let mut state = self.state.write().await;
        let character = state
            .characters
            .get_mut(id)
            .ok_or_else(|| not_found(format!("character {}", id)))?;
        patch.apply(character);
        character.updated_at = Utc::now();
        Ok(character.clone())
    }

    async fn delete_character(&self, id: &str) -> StorybookResult<bool> {
        Ok(self.state.write().await.characters.remove(id).is_some())
    }
}

#[async_trait]
impl UsageLedger for InMemoryStoryStore {
    async fn increment_credits_used(&self, user_id: &str, tokens: i64) -> StorybookResult<()> {
        *self
            .state
            .write()
            .await
            .credits
            .entry(user_id.to_string())
            .or_default() += tokens;
        Ok(())
    }
}
