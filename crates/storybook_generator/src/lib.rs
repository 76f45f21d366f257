//! Storybook generation pipeline and the services built around it.
//!
//! The pipeline turns a story idea into a 28-page storybook in three
//! strictly sequential stages, each reading what the previous one stored
//! in `creation_params`:
//!
//! 1. **Bible**: characters, setting and theme ([`StoryStages::generate_bible`])
//! 2. **Arc**: three acts over fourteen spreads ([`StoryStages::generate_arc`])
//! 3. **Draft**: left/right page text for every spread ([`StoryStages::generate_draft`])
//!
//! [`StorybookGenerator`] drives the three stages and persists the pages.
//! [`ChatOrchestrator`] handles studio chat turns (answer or rewrite), and
//! [`Illustrator`] fills in missing page illustrations. The remaining
//! services are thin, owner-checked wrappers over the record store.
//!
//! Every collaborator is injected as a trait object, so tests run the whole
//! pipeline against an in-memory store and a scripted oracle.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod characters;
mod chat;
mod illustrate;
mod models;
mod pipeline;
mod prompts;
mod services;
mod stages;
mod usage;

pub use characters::{CharacterResolver, NO_GROUNDING};
pub use chat::{ChatOrchestrator, ChatReply, RewriteOutcome};
pub use illustrate::{IllustratedPage, IllustrationReport, Illustrator, PageOutcome, build_image_prompt};
pub use models::StageModels;
pub use pipeline::{GenerateStorybook, GenerateStorybookBuilder, StorybookGenerator};
pub use prompts::{PromptTemplate, arc_context, bible_context, script_context};
pub use services::{
    AuthorInfo, CategoryInfo, CharacterService, CreateStorybook, ExplorePage, ExploreQuery,
    ExploreService, NewPageContent, Pagination, PublicStorybook, Services, StorybookService,
    StudioService,
};
pub use stages::StoryStages;
pub use usage::UsageRecorder;
