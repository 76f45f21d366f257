//! Core data types for the storybook generation service.
//!
//! Domain records (storybooks, pages, characters), the typed pipeline
//! state carried in `creation_params`, and the stage schemas that guard
//! every structured value crossing a stage boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod character;
mod page;
mod pipeline_state;
mod provider;
mod schema;
mod spread;
mod storybook;
mod usage;

pub use character::{Character, CharacterPatch, NewCharacter, NewCharacterBuilder};
pub use page::{NewPage, NewPageBuilder, Page, PagePatch};
pub use pipeline_state::PipelineState;
pub use provider::{ModelChoice, Provider};
pub use schema::{
    Act, ArcSpread, BibleCharacter, ChatAction, Classification, FinalRewrite, FinalScript,
    OutputSchema, SettingOnly, SpreadScript, StoryArc, StoryBible, Validate, validate_value,
};
pub use spread::{ACT_COUNT, PAGE_COUNT, SPREAD_COUNT, page_spread, spread_pages};
pub use storybook::{
    NewStorybook, NewStorybookBuilder, Storybook, StorybookDetail, StorybookStatus,
};
pub use usage::TokenUsage;
