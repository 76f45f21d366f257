//! Owner-checked services over the record store, and the bundle that wires
//! every service to one store and oracle set.

mod characters;
mod explore;
mod storybooks;
mod studio;

pub use characters::CharacterService;
pub use explore::{AuthorInfo, CategoryInfo, ExplorePage, ExploreQuery, ExploreService, Pagination, PublicStorybook};
pub use storybooks::{CreateStorybook, StorybookService};
pub use studio::{NewPageContent, StudioService};

use crate::{
    CharacterResolver, ChatOrchestrator, Illustrator, StageModels, StoryStages,
    StorybookGenerator, UsageRecorder,
};
use std::sync::Arc;
use storybook_core::Storybook;
use storybook_error::{ServiceError, StorybookResult};
use storybook_interface::{ImageOracle, StoryOracle, StoryStore, UsageLedger};

/// Upper bound for any page size.
pub(crate) const MAX_LIMIT: i64 = 100;

/// Load a storybook `user_id` owns. Missing is not-found, foreign is forbidden.
pub(crate) async fn owned_storybook(
    store: &dyn StoryStore,
    user_id: &str,
    storybook_id: &str,
) -> StorybookResult<Storybook> {
    let storybook = store
        .get_storybook(storybook_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("storybook", storybook_id))?;
    if !storybook.is_owned_by(user_id) {
        return Err(ServiceError::forbidden("storybook belongs to another user").into());
    }
    Ok(storybook)
}

/// Every service, sharing one store and one set of oracles.
#[derive(Debug, Clone)]
pub struct Services {
    /// Pipeline driver
    pub generator: StorybookGenerator,
    /// Chat and rewrite
    pub chat: ChatOrchestrator,
    /// Illustration
    pub illustrator: Illustrator,
    /// Storybook listing and lifecycle
    pub storybooks: StorybookService,
    /// Title and page editing
    pub studio: StudioService,
    /// Characters and presets
    pub characters: CharacterService,
    /// Public listing
    pub explore: ExploreService,
}

impl Services {
    /// Wire every service.
    pub fn new(
        store: Arc<dyn StoryStore>,
        ledger: Arc<dyn UsageLedger>,
        oracle: Arc<dyn StoryOracle>,
        images: Arc<dyn ImageOracle>,
        models: StageModels,
    ) -> Self {
        let usage = UsageRecorder::new(ledger);
        let resolver = CharacterResolver::new(store.clone());
        let stages = StoryStages::new(store.clone(), oracle.clone(), usage.clone(), models.clone());
        Self {
            generator: StorybookGenerator::new(store.clone(), stages),
            chat: ChatOrchestrator::new(oracle, resolver.clone(), usage, models.clone()),
            illustrator: Illustrator::new(store.clone(), images, resolver, models.image),
            storybooks: StorybookService::new(store.clone()),
            studio: StudioService::new(store.clone()),
            characters: CharacterService::new(store.clone()),
            explore: ExploreService::new(store),
        }
    }
}
