//! Character resolution for pages and spreads.
//!
//! Resolution never fails. Each tier that cannot answer (missing page, no
//! character ids, unknown ids, store errors) falls through to the next, and
//! the last tier is the storybook bible. An empty result means there is no
//! grounding available.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use storybook_core::{BibleCharacter, SPREAD_COUNT, spread_pages};
use storybook_interface::StoryStore;
use tracing::instrument;

/// Line suffix used when a spread resolves to no characters.
pub const NO_GROUNDING: &str = "no page-specific character information";

/// Looks up which characters appear on a page or spread.
#[derive(Clone)]
pub struct CharacterResolver {
    store: Arc<dyn StoryStore>,
}

impl std::fmt::Debug for CharacterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterResolver").finish_non_exhaustive()
    }
}

impl CharacterResolver {
    /// Resolve against `store`.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// Characters on one page, falling back to the bible cast.
    #[instrument(skip(self))]
    pub async fn for_page(&self, storybook_id: &str, page_number: i32) -> Vec<BibleCharacter> {
        match self.by_page(storybook_id, page_number).await {
            Some(characters) => characters,
            None => self.by_bible(storybook_id).await,
        }
    }

    /// Characters on both pages of a spread, de-duplicated by name with the
    /// first occurrence kept, falling back to the bible cast.
    #[instrument(skip(self))]
    pub async fn for_spread(&self, storybook_id: &str, spread: i32) -> Vec<BibleCharacter> {
        let (left, right) = spread_pages(spread);
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for page_number in [left, right] {
            for character in self.by_page(storybook_id, page_number).await.unwrap_or_default() {
                if seen.insert(character.character_name.clone()) {
                    merged.push(character);
                }
            }
        }
        if merged.is_empty() {
            self.by_bible(storybook_id).await
        } else {
            merged
        }
    }

    /// One grounding line per spread, `"Spread N: <names> — <descriptions>"`.
    ///
    /// The fourteen lookups run concurrently and all finish before returning.
    #[instrument(skip(self))]
    pub async fn grounding_block(&self, storybook_id: &str) -> String {
        let spreads = 1..=SPREAD_COUNT as i32;
        let resolved = join_all(spreads.clone().map(|n| self.for_spread(storybook_id, n))).await;
        spreads
            .zip(resolved)
            .map(|(spread, characters)| grounding_line(spread, &characters))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Characters named on the page row, or `None` to fall through.
    async fn by_page(&self, storybook_id: &str, page_number: i32) -> Option<Vec<BibleCharacter>> {
        let page = match self.store.get_page(storybook_id, page_number).await {
            Ok(Some(page)) => page,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, page_number, "Page lookup failed, falling back");
                return None;
            }
        };
        if page.character_ids.is_empty() {
            return None;
        }
        match self.store.get_characters(&page.character_ids).await {
            Ok(characters) if !characters.is_empty() => {
                Some(characters.iter().map(BibleCharacter::from).collect())
            }
            Ok(_) => {
                tracing::debug!(page_number, "Page characters not found, falling back");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, page_number, "Character lookup failed, falling back");
                None
            }
        }
    }

    async fn by_bible(&self, storybook_id: &str) -> Vec<BibleCharacter> {
        match self.store.get_storybook(storybook_id).await {
            Ok(Some(storybook)) => storybook
                .creation_params
                .and_then(|params| params.bible)
                .map(|bible| bible.characters)
                .unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Storybook lookup failed, no grounding available");
                Vec::new()
            }
        }
    }
}

fn grounding_line(spread: i32, characters: &[BibleCharacter]) -> String {
    if characters.is_empty() {
        return format!("Spread {}: {}", spread, NO_GROUNDING);
    }
    let names = characters
        .iter()
        .map(|c| c.character_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let descriptions = characters
        .iter()
        .map(|c| format!("{}: {}; looks like {}", c.character_name, c.description, c.visual_features))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("Spread {}: {} — {}", spread, names, descriptions)
}
