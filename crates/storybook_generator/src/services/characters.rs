//! User characters and presets.

use std::sync::Arc;
use storybook_core::{Character, CharacterPatch, NewCharacter};
use storybook_error::{ServiceError, StorybookResult};
use storybook_interface::StoryStore;
use tracing::instrument;

/// Character management. Presets are read-only for everyone.
#[derive(Clone)]
pub struct CharacterService {
    store: Arc<dyn StoryStore>,
}

impl std::fmt::Debug for CharacterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterService").finish_non_exhaustive()
    }
}

impl CharacterService {
    /// Create the service.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// The caller's characters, optionally followed by presets.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: &str, include_presets: bool) -> StorybookResult<Vec<Character>> {
        self.store.list_characters(user_id, include_presets).await
    }

    /// Preset characters ordered by name.
    #[instrument(skip(self))]
    pub async fn presets(&self) -> StorybookResult<Vec<Character>> {
        self.store.list_presets().await
    }

    /// One character the caller owns, or a preset.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: &str, character_id: &str) -> StorybookResult<Character> {
        let character = self.find(character_id).await?;
        if !character.is_visible_to(user_id) {
            return Err(ServiceError::forbidden("character belongs to another user").into());
        }
        Ok(character)
    }

    /// Create a character owned by the caller.
    #[instrument(skip(self, new))]
    pub async fn create(&self, user_id: &str, new: NewCharacter) -> StorybookResult<Character> {
        new.check()?;
        let character = self.store.create_character(user_id, new).await?;
        tracing::info!(character_id = %character.id, "Character created");
        Ok(character)
    }

    /// Update a character the caller owns.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user_id: &str,
        character_id: &str,
        patch: &CharacterPatch,
    ) -> StorybookResult<Character> {
        self.editable(user_id, character_id).await?;
        if patch.is_empty() {
            return Err(ServiceError::bad_request("no character fields to update").into());
        }
        for (field, value) in [
            ("character_name", &patch.character_name),
            ("visual_features", &patch.visual_features),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ServiceError::bad_request(format!("{} must not be blank", field)).into());
            }
        }
        self.store.update_character(character_id, patch).await
    }

    /// Delete a character the caller owns.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, character_id: &str) -> StorybookResult<()> {
        self.editable(user_id, character_id).await?;
        if !self.store.delete_character(character_id).await? {
            return Err(ServiceError::not_found("character", character_id).into());
        }
        tracing::info!("Character deleted");
        Ok(())
    }

    async fn find(&self, character_id: &str) -> StorybookResult<Character> {
        self.store
            .get_character(character_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("character", character_id).into())
    }

    async fn editable(&self, user_id: &str, character_id: &str) -> StorybookResult<Character> {
        let character = self.find(character_id).await?;
        if character.is_preset {
            return Err(ServiceError::forbidden("cannot modify preset characters").into());
        }
        if character.user_id.as_deref() != Some(user_id) {
            return Err(ServiceError::forbidden("character belongs to another user").into());
        }
        Ok(character)
    }
}
