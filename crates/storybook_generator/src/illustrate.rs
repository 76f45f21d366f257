//! Page illustration: image prompts and missing-image generation.

use crate::CharacterResolver;
use crate::services::owned_storybook;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storybook_core::{BibleCharacter, ModelChoice, Page, PagePatch};
use storybook_error::StorybookResult;
use storybook_interface::{GeneratedImage, ImageOracle, ImageRequest, StoryStore};
use tracing::instrument;

/// Illustration prompt for a page.
///
/// ```
/// use chrono::Utc;
/// use storybook_core::{BibleCharacter, Page};
/// use storybook_generator::build_image_prompt;
///
/// let page = Page {
///     id: "p1".into(),
///     storybook_id: "sb".into(),
///     page_number: 1,
///     script_text: Some("Ember hid behind a rock.".into()),
///     image_url: None,
///     audio_url: None,
///     image_prompt: None,
///     image_style: None,
///     character_ids: vec![],
///     background_description: None,
///     created_at: Utc::now(),
/// };
/// let ember = BibleCharacter {
///     character_name: "Ember".into(),
///     description: "a shy dragon".into(),
///     visual_features: "small, green scales".into(),
/// };
/// let prompt = build_image_prompt(&page, &[ember], Some("watercolor"));
/// assert!(prompt.starts_with(
///     "Create a fairy tale illustration for the following story script: Ember hid behind a rock."
/// ));
/// assert!(prompt.contains("- Ember: small, green scales"));
/// assert!(prompt.ends_with("Style: watercolor"));
/// ```
pub fn build_image_prompt(page: &Page, characters: &[BibleCharacter], style: Option<&str>) -> String {
    let script = page.script_text.as_deref().unwrap_or_default().trim();
    let mut prompt = format!(
        "Create a fairy tale illustration for the following story script: {}",
        script
    );
    if !characters.is_empty() {
        prompt.push_str("\n\nCharacters:");
        for character in characters {
            prompt.push_str(&format!(
                "\n- {}: {}",
                character.character_name, character.visual_features
            ));
        }
    }
    if let Some(background) = non_blank(page.background_description.as_deref()) {
        prompt.push_str(&format!("\n\nBackground: {}", background));
    }
    if let Some(style) = non_blank(style) {
        prompt.push_str(&format!("\n\nStyle: {}", style));
    }
    prompt
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// A page that was illustrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IllustratedPage {
    /// Page number
    pub page_number: i32,
    /// Where the illustration was stored
    pub image: GeneratedImage,
}

/// A page that failed or was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutcome {
    /// Page number
    pub page_number: i32,
    /// Reason
    pub reason: String,
}

/// Result of one illustration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IllustrationReport {
    /// Pages sent to the image oracle
    pub processed: usize,
    /// Pages illustrated
    pub succeeded: Vec<IllustratedPage>,
    /// Pages whose generation or update failed
    pub failed: Vec<PageOutcome>,
    /// Pages left alone
    pub skipped: Vec<PageOutcome>,
}

/// Generates illustrations for pages that lack one.
#[derive(Clone)]
pub struct Illustrator {
    store: Arc<dyn StoryStore>,
    images: Arc<dyn ImageOracle>,
    resolver: CharacterResolver,
    model: ModelChoice,
}

impl std::fmt::Debug for Illustrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Illustrator")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Illustrator {
    /// Create an illustrator using `model` for every image.
    pub fn new(
        store: Arc<dyn StoryStore>,
        images: Arc<dyn ImageOracle>,
        resolver: CharacterResolver,
        model: ModelChoice,
    ) -> Self {
        Self {
            store,
            images,
            resolver,
            model,
        }
    }

    /// Write an image prompt for every page that has text but no prompt.
    /// Returns how many prompts were written.
    #[instrument(skip(self))]
    pub async fn generate_image_prompts(&self, user_id: &str, storybook_id: &str) -> StorybookResult<usize> {
        let storybook = owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        let style = storybook.creation_params.and_then(|params| params.style);

        let mut written = 0;
        for page in self.store.list_pages(storybook_id).await? {
            if non_blank(page.script_text.as_deref()).is_none()
                || non_blank(page.image_prompt.as_deref()).is_some()
            {
                continue;
            }
            let characters = self.resolver.for_page(storybook_id, page.page_number).await;
            let patch = PagePatch {
                image_prompt: Some(build_image_prompt(&page, &characters, style.as_deref())),
                image_style: page.image_style.is_none().then(|| style.clone()).flatten(),
                ..PagePatch::default()
            };
            self.store
                .update_page(storybook_id, page.page_number, &patch)
                .await?;
            written += 1;
        }
        tracing::info!(written, "Image prompts written");
        Ok(written)
    }

    /// Illustrate every page that has an image prompt and no image.
    ///
    /// The first existing image, or else the first one generated, is passed
    /// as the style reference for the rest. A failing page is reported and
    /// the run continues.
    #[instrument(skip(self))]
    pub async fn generate_missing_images(
        &self,
        user_id: &str,
        storybook_id: &str,
    ) -> StorybookResult<IllustrationReport> {
        owned_storybook(self.store.as_ref(), user_id, storybook_id).await?;
        let pages = self.store.list_pages(storybook_id).await?;

        let mut reference = pages.iter().find_map(|page| page.image_url.clone());
        let mut report = IllustrationReport::default();
        for page in &pages {
            if page.image_url.is_some() {
                report.skipped.push(outcome(page, "already illustrated"));
                continue;
            }
            let Some(prompt) = non_blank(page.image_prompt.as_deref()) else {
                report.skipped.push(outcome(page, "no image prompt"));
                continue;
            };

            report.processed += 1;
            let request = ImageRequest {
                model: self.model.clone(),
                prompt: prompt.to_string(),
                storage_path: format!("{}/{}", storybook_id, page.page_number),
                reference_image_url: reference.clone(),
            };
            match self.illustrate(storybook_id, page.page_number, request).await {
                Ok(image) => {
                    if reference.is_none() {
                        reference = Some(image.url.clone());
                    }
                    report.succeeded.push(IllustratedPage {
                        page_number: page.page_number,
                        image,
                    });
                }
                Err(e) => {
                    tracing::warn!(page_number = page.page_number, error = %e, "Page illustration failed");
                    report.failed.push(outcome(page, &e.to_string()));
                }
            }
        }
        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Illustration run complete"
        );
        Ok(report)
    }

    async fn illustrate(
        &self,
        storybook_id: &str,
        page_number: i32,
        request: ImageRequest,
    ) -> StorybookResult<GeneratedImage> {
        let image = self.images.generate_image(request).await?;
        let patch = PagePatch {
            image_url: Some(image.url.clone()),
            ..PagePatch::default()
        };
        self.store.update_page(storybook_id, page_number, &patch).await?;
        Ok(image)
    }
}

fn outcome(page: &Page, reason: &str) -> PageOutcome {
    PageOutcome {
        page_number: page.page_number,
        reason: reason.to_string(),
    }
}
