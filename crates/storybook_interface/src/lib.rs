//! Trait definitions for the storybook service's external collaborators.
//!
//! The generation pipeline never talks to a database, an LLM vendor or an
//! identity provider directly. It goes through the traits defined here, which
//! the backend crates implement and tests replace with in-memory fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod oracle;
mod store;

pub use auth::{Audience, Claims, TokenVerifier};
pub use oracle::{
    Generated, GeneratedImage, ImageOracle, ImageRequest, StoryOracle, StructuredRequest,
    StructuredResponse, TextResponse, generate_validated,
};
pub use store::{
    CategoryCount, CharacterRepository, Listing, PageRepository, StoryStore, StorybookFilter,
    StorybookPatch, StorybookRepository, StorybookSort, UsageLedger,
};
