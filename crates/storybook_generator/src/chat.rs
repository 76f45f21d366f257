//! Studio chat: classify a message, then answer it or rewrite the script.

use crate::prompts::{self, formatted_spreads, script_context};
use crate::{CharacterResolver, StageModels, UsageRecorder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storybook_core::{ChatAction, Classification, FinalRewrite, FinalScript, Validate};
use storybook_error::{
    OracleError, OracleErrorKind, ServiceError, StorybookResult, ValidationError,
};
use storybook_interface::{StoryOracle, generate_validated};
use tracing::instrument;

/// A rewritten script and what changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutcome {
    /// The rewritten script, identifiers pinned to the original
    pub script: FinalScript,
    /// One or two sentences describing the edit
    pub change_summary: String,
}

/// Reply to one chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Answer, or the change summary for an edit
    pub assistant_message: String,
    /// How the message was routed
    pub action: ChatAction,
    /// Rewritten script, only for edits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<FinalScript>,
}

/// Routes chat messages to question answering or script rewriting.
///
/// A turn makes one classification call plus one answer or rewrite call.
/// Nothing is retried; any failure aborts the turn.
#[derive(Clone)]
pub struct ChatOrchestrator {
    oracle: Arc<dyn StoryOracle>,
    resolver: CharacterResolver,
    usage: UsageRecorder,
    models: StageModels,
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

impl ChatOrchestrator {
    /// Create the orchestrator.
    pub fn new(
        oracle: Arc<dyn StoryOracle>,
        resolver: CharacterResolver,
        usage: UsageRecorder,
        models: StageModels,
    ) -> Self {
        Self {
            oracle,
            resolver,
            usage,
            models,
        }
    }

    /// Run one chat turn for `caller` against `script`.
    ///
    /// The script must belong to the caller.
    #[instrument(skip(self, script, message), fields(storybook_id = %script.storybook_id))]
    pub async fn respond(
        &self,
        caller: &str,
        script: FinalScript,
        message: &str,
    ) -> StorybookResult<ChatReply> {
        if script.user_id != caller {
            return Err(ServiceError::forbidden("script belongs to another user").into());
        }
        if message.trim().is_empty() {
            return Err(ServiceError::bad_request("message is required").into());
        }

        let action = self.classify(message, Some(caller)).await?;
        tracing::debug!(%action, "Message classified");
        match action {
            ChatAction::Question => {
                let answer = self.answer(&script, message, Some(caller)).await?;
                Ok(ChatReply {
                    assistant_message: answer,
                    action,
                    script: None,
                })
            }
            ChatAction::Edit => {
                let outcome = self.rewrite_full(&script, message, Some(caller)).await?;
                Ok(ChatReply {
                    assistant_message: outcome.change_summary,
                    action,
                    script: Some(outcome.script),
                })
            }
        }
    }

    /// Decide whether `message` asks for an edit or a question. Ambiguous
    /// messages are edits.
    #[instrument(skip(self, message))]
    pub async fn classify(&self, message: &str, user_id: Option<&str>) -> StorybookResult<ChatAction> {
        let prompt = prompts::CLASSIFY.render(&[("message", message)]);
        let generated =
            generate_validated::<Classification>(self.oracle.as_ref(), &self.models.chat, prompt)
                .await?;
        self.usage.record(user_id, generated.usage.total()).await;
        Ok(generated.value.action)
    }

    /// Answer a question about `script` in a few sentences.
    ///
    /// A blank reply is an error.
    #[instrument(skip(self, script, question), fields(storybook_id = %script.storybook_id))]
    pub async fn answer(
        &self,
        script: &FinalScript,
        question: &str,
        user_id: Option<&str>,
    ) -> StorybookResult<String> {
        let context = script_context(script);
        let prompt = prompts::ANSWER.render(&[
            ("story_context", context.as_str()),
            ("question", question),
        ]);
        let reply = self.oracle.generate_text(&self.models.chat, &prompt).await?;
        self.usage.record(user_id, reply.usage.total()).await;

        let answer = reply.text.trim();
        if answer.is_empty() {
            tracing::error!("Oracle returned an empty answer");
            return Err(OracleError::new(OracleErrorKind::EmptyResponse("answer".to_string())).into());
        }
        Ok(answer.to_string())
    }

    /// Rewrite the whole script according to `edit_request`.
    ///
    /// The returned script keeps the original storybook and user ids
    /// whatever the oracle echoes. Usage is billed to `requesting_user_id`,
    /// or to the script's owner when none is given.
    #[instrument(skip(self, script, edit_request), fields(storybook_id = %script.storybook_id))]
    pub async fn rewrite_full(
        &self,
        script: &FinalScript,
        edit_request: &str,
        requesting_user_id: Option<&str>,
    ) -> StorybookResult<RewriteOutcome> {
        script.validate().map_err(|e| e.within("script"))?;
        if edit_request.trim().is_empty() {
            return Err(ValidationError::new("edit_request", "must not be blank").into());
        }

        let grounding = self.resolver.grounding_block(&script.storybook_id).await;
        let spreads = formatted_spreads(script);
        let prompt = prompts::REWRITE.render(&[
            ("character_context", grounding.as_str()),
            ("formatted_spreads", spreads.as_str()),
            ("edit_request", edit_request),
        ]);
        let generated =
            generate_validated::<FinalRewrite>(self.oracle.as_ref(), &self.models.rewrite, prompt)
                .await?;

        let billed = requesting_user_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(script.user_id.as_str());
        self.usage.record(Some(billed), generated.usage.total()).await;

        let (mut rewritten, change_summary) = generated.value.into_parts();
        if rewritten.storybook_id != script.storybook_id || rewritten.user_id != script.user_id {
            tracing::warn!(
                echoed_storybook = %rewritten.storybook_id,
                echoed_user = %rewritten.user_id,
                "Rewrite echoed foreign identifiers, pinning to the original"
            );
        }
        rewritten.storybook_id = script.storybook_id.clone();
        rewritten.user_id = script.user_id.clone();
        tracing::info!("Script rewritten");
        Ok(RewriteOutcome {
            script: rewritten,
            change_summary,
        })
    }

    /// Rewrite a single passage of text. A blank result is an error.
    #[instrument(skip(self, text, edit_request))]
    pub async fn rewrite_plain_text(
        &self,
        text: &str,
        edit_request: &str,
        user_id: Option<&str>,
    ) -> StorybookResult<String> {
        if text.trim().is_empty() {
            return Err(ValidationError::new("text", "must not be blank").into());
        }
        if edit_request.trim().is_empty() {
            return Err(ValidationError::new("edit_request", "must not be blank").into());
        }
        let prompt = prompts::PLAIN_REWRITE.render(&[
            ("original_text", text),
            ("edit_request", edit_request),
        ]);
        let reply = self.oracle.generate_text(&self.models.rewrite, &prompt).await?;
        self.usage.record(user_id, reply.usage.total()).await;

        let rewritten = reply.text.trim();
        if rewritten.is_empty() {
            return Err(
                OracleError::new(OracleErrorKind::EmptyResponse("plain text rewrite".to_string()))
                    .into(),
            );
        }
        Ok(rewritten.to_string())
    }
}
