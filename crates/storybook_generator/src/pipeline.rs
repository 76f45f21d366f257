//! The pipeline driver: prompt in, 28-page storybook out.

use crate::StoryStages;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storybook_core::{
    NewPage, NewStorybook, PipelineState, StorybookDetail, StorybookStatus,
};
use storybook_error::{ServiceError, StorybookResult, ValidationError};
use storybook_interface::{StoryStore, StorybookPatch};
use tracing::instrument;

/// Request to generate a storybook from a story idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), build_fn(error = "ValidationError"))]
pub struct GenerateStorybook {
    /// The story idea
    pub prompt: String,
    /// Working title
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub title: Option<String>,
    /// Preset characters to cast verbatim
    #[builder(default)]
    #[serde(default, alias = "characterIds")]
    pub character_ids: Vec<String>,
    /// Theme hint
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub theme: Option<String>,
    /// Illustration style hint
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub style: Option<String>,
    /// Page count requested by the client
    #[builder(setter(strip_option), default)]
    #[serde(default, alias = "pageCount")]
    pub page_count: Option<i32>,
}

impl GenerateStorybook {
    /// Start building a request.
    pub fn builder() -> GenerateStorybookBuilder {
        GenerateStorybookBuilder::default()
    }
}

/// Creates a storybook and runs Bible, Arc and Draft in order, then stores
/// the script as pages.
///
/// A stage failure aborts the run and leaves the storybook in `pending`
/// with whatever artifacts were stored, so stages can be re-run against it.
#[derive(Clone)]
pub struct StorybookGenerator {
    store: Arc<dyn StoryStore>,
    stages: StoryStages,
}

impl std::fmt::Debug for StorybookGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorybookGenerator")
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

impl StorybookGenerator {
    /// Create a driver over `stages`, persisting into `store`.
    pub fn new(store: Arc<dyn StoryStore>, stages: StoryStages) -> Self {
        Self { store, stages }
    }

    /// The stage runner, for re-running single stages.
    pub fn stages(&self) -> &StoryStages {
        &self.stages
    }

    /// Generate a complete storybook for `user_id`.
    #[instrument(skip(self, request), fields(storybook_id = tracing::field::Empty))]
    pub async fn generate(
        &self,
        user_id: &str,
        request: GenerateStorybook,
    ) -> StorybookResult<StorybookDetail> {
        if request.prompt.trim().is_empty() {
            return Err(ServiceError::bad_request("prompt is required to generate a storybook").into());
        }

        let params = PipelineState {
            prompt: request.prompt,
            theme: request.theme,
            style: request.style,
            page_count: request.page_count,
            character_ids: request.character_ids.clone(),
            bible: None,
            arc: None,
        };
        let storybook = self
            .store
            .create_storybook(NewStorybook {
                user_id: user_id.to_string(),
                title: request.title.unwrap_or_default(),
                status: StorybookStatus::Pending,
                is_public: false,
                page_count: request.page_count.unwrap_or(0),
                category: None,
                tags: Vec::new(),
                character_ids: request.character_ids,
                creation_params: Some(params),
            })
            .await?;
        tracing::Span::current().record("storybook_id", storybook.id.as_str());
        tracing::info!("Storybook created, running stages");

        self.stages.generate_bible(&storybook.id).await?;
        self.stages.generate_arc(&storybook.id).await?;
        let script = self.stages.generate_draft(&storybook.id).await?;

        let pages: Vec<NewPage> = script
            .page_texts()
            .into_iter()
            .map(|(page_number, text)| NewPage::with_text(page_number, text))
            .collect();
        let stored = self.store.insert_pages(&storybook.id, pages).await?;
        let page_count = i32::try_from(stored.len()).unwrap_or(i32::MAX);
        let storybook = self
            .store
            .update_storybook(
                &storybook.id,
                &StorybookPatch {
                    page_count: Some(page_count),
                    ..StorybookPatch::default()
                },
            )
            .await?;
        tracing::info!(page_count, "Pages persisted");

        let pages = self.store.list_pages(&storybook.id).await?;
        Ok(StorybookDetail { storybook, pages })
    }
}
