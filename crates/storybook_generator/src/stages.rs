//! The Bible, Arc and Draft generation stages.

use crate::prompts::{self, arc_context, bible_context};
use crate::{CharacterResolver, StageModels, UsageRecorder};
use std::sync::Arc;
use storybook_core::{
    BibleCharacter, FinalScript, PipelineState, SettingOnly, StoryArc, StoryBible, Storybook,
    Validate,
};
use storybook_error::{PipelineInputError, StageError, StorybookResult, ValidationError};
use storybook_interface::{StoryOracle, StoryStore, generate_validated};
use tracing::instrument;

/// A storybook whose stage preconditions hold.
struct StageInput {
    storybook: Storybook,
    params: PipelineState,
}

/// Runs one generation stage at a time against a stored storybook.
///
/// Each stage reads `creation_params`, calls the oracle with a stage prompt,
/// validates the reply and only then writes its artifact back with a
/// version check. A failed stage leaves `creation_params` untouched.
#[derive(Clone)]
pub struct StoryStages {
    store: Arc<dyn StoryStore>,
    oracle: Arc<dyn StoryOracle>,
    resolver: CharacterResolver,
    usage: UsageRecorder,
    models: StageModels,
}

impl std::fmt::Debug for StoryStages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryStages")
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

impl StoryStages {
    /// Create the stage runner.
    pub fn new(
        store: Arc<dyn StoryStore>,
        oracle: Arc<dyn StoryOracle>,
        usage: UsageRecorder,
        models: StageModels,
    ) -> Self {
        Self {
            resolver: CharacterResolver::new(store.clone()),
            store,
            oracle,
            usage,
            models,
        }
    }

    /// Generate the story bible and store it at `creation_params.bible`.
    ///
    /// With preset character ids the characters are copied verbatim from
    /// their records and the oracle only writes the setting and theme.
    #[instrument(skip(self))]
    pub async fn generate_bible(&self, storybook_id: &str) -> StorybookResult<StoryBible> {
        let input = self.load(storybook_id).await?;
        let bible = if input.params.character_ids.is_empty() {
            self.freeform_bible(&input).await
        } else {
            self.preset_bible(&input).await
        }
        .map_err(|e| StageError::new("bible", e))?;

        let mut params = input.params.clone();
        params.bible = Some(bible.clone());
        self.save(&input, &params)
            .await
            .map_err(|e| StageError::new("bible", e))?;
        tracing::info!(characters = bible.characters.len(), "Bible stage complete");
        Ok(bible)
    }

    /// Generate the three-act, fourteen-spread arc and store it at
    /// `creation_params.arc`.
    #[instrument(skip(self))]
    pub async fn generate_arc(&self, storybook_id: &str) -> StorybookResult<StoryArc> {
        let input = self.load(storybook_id).await?;
        let prompt = prompts::ARC.render(&[
            ("user_input", input.params.prompt.as_str()),
            ("story_bible", bible_context(input.params.bible.as_ref()).as_str()),
        ]);
        let generated = generate_validated::<StoryArc>(self.oracle.as_ref(), &self.models.arc, prompt)
            .await
            .map_err(|e| StageError::new("arc", e))?;
        self.bill(&input, generated.usage.total()).await;

        let mut params = input.params.clone();
        params.arc = Some(generated.value.clone());
        self.save(&input, &params)
            .await
            .map_err(|e| StageError::new("arc", e))?;
        tracing::info!("Arc stage complete");
        Ok(generated.value)
    }

    /// Generate the final script.
    ///
    /// The script is not written to `creation_params`; the pipeline driver
    /// persists it as pages. Its identifiers always come from the stored
    /// storybook, never from the oracle.
    #[instrument(skip(self))]
    pub async fn generate_draft(&self, storybook_id: &str) -> StorybookResult<FinalScript> {
        let input = self.load(storybook_id).await?;
        let grounding = self.resolver.grounding_block(storybook_id).await;
        let prompt = prompts::DRAFT.render(&[
            ("user_input", input.params.prompt.as_str()),
            ("story_bible", bible_context(input.params.bible.as_ref()).as_str()),
            ("story_arc", arc_context(input.params.arc.as_ref()).as_str()),
            ("character_context", grounding.as_str()),
        ]);
        let generated =
            generate_validated::<FinalScript>(self.oracle.as_ref(), &self.models.draft, prompt)
                .await
                .map_err(|e| StageError::new("draft", e))?;
        self.bill(&input, generated.usage.total()).await;

        let mut script = generated.value;
        script.storybook_id = input.storybook.id.clone();
        script.user_id = input.storybook.user_id.clone();
        tracing::info!(spreads = script.spreads.len(), "Draft stage complete");
        Ok(script)
    }

    async fn freeform_bible(&self, input: &StageInput) -> StorybookResult<StoryBible> {
        let prompt = prompts::BIBLE.render(&[
            ("user_input", input.params.prompt.as_str()),
            ("preset_characters", "[]"),
        ]);
        let generated =
            generate_validated::<StoryBible>(self.oracle.as_ref(), &self.models.bible, prompt)
                .await?;
        self.bill(input, generated.usage.total()).await;
        Ok(generated.value)
    }

    async fn preset_bible(&self, input: &StageInput) -> StorybookResult<StoryBible> {
        let requested = &input.params.character_ids;
        let records = self.store.get_characters(requested).await?;
        if records.is_empty() {
            return Err(PipelineInputError::new(&input.storybook.id, "character_ids").into());
        }
        let missing: Vec<&str> = requested
            .iter()
            .filter(|id| !records.iter().any(|record| &record.id == *id))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            tracing::warn!(?missing, "Preset characters not found; continuing with the rest");
        }
        let presets: Vec<BibleCharacter> = records.iter().map(BibleCharacter::from).collect();
        tracing::debug!(count = presets.len(), "Using preset characters");

        let preset_json = serde_json::to_string_pretty(&presets)
            .map_err(|e| ValidationError::new("preset_characters", e.to_string()))?;
        let prompt = prompts::BIBLE.render(&[
            ("user_input", input.params.prompt.as_str()),
            ("preset_characters", preset_json.as_str()),
        ]);
        let generated =
            generate_validated::<SettingOnly>(self.oracle.as_ref(), &self.models.bible, prompt)
                .await?;
        self.bill(input, generated.usage.total()).await;

        let bible = StoryBible::from_parts(presets, generated.value);
        bible.validate()?;
        Ok(bible)
    }

    /// Load the storybook and check the preconditions every stage shares.
    async fn load(&self, storybook_id: &str) -> StorybookResult<StageInput> {
        let storybook = self
            .store
            .get_storybook(storybook_id)
            .await?
            .ok_or_else(|| PipelineInputError::new(storybook_id, "storybook"))?;
        let params = storybook
            .creation_params
            .clone()
            .ok_or_else(|| PipelineInputError::new(storybook_id, "creation_params"))?;
        if params.prompt.trim().is_empty() {
            return Err(PipelineInputError::new(storybook_id, "creation_params.prompt").into());
        }
        Ok(StageInput { storybook, params })
    }

    async fn save(&self, input: &StageInput, params: &PipelineState) -> StorybookResult<()> {
        self.store
            .update_creation_params(&input.storybook.id, input.storybook.params_version, params)
            .await?;
        Ok(())
    }

    async fn bill(&self, input: &StageInput, tokens: i64) {
        self.usage
            .record(Some(&input.storybook.user_id), tokens)
            .await;
    }
}
