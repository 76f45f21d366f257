//! Typed `creation_params`: the state accumulated by the generation stages.

use crate::{StoryArc, StoryBible, Validate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storybook_error::ValidationError;

/// Generation inputs plus every stage artifact produced so far.
///
/// Stages only ever add artifacts. Absent artifacts serialize as `{}`
/// and `{}` deserializes back to `None`, so the stored document keeps the
/// `{prompt, theme, style, pageCount, arc: {}, bible: {}}` shape a fresh
/// storybook starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// The user's story idea
    #[serde(default)]
    pub prompt: String,
    /// Optional theme hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Optional style hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Requested page count, as sent by the client
    #[serde(default, rename = "pageCount", skip_serializing_if = "Option::is_none")]
    pub page_count: Option<i32>,
    /// Preset characters the bible must use verbatim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub character_ids: Vec<String>,
    /// Bible stage output
    #[serde(default, with = "empty_object")]
    pub bible: Option<StoryBible>,
    /// Arc stage output
    #[serde(default, with = "empty_object")]
    pub arc: Option<StoryArc>,
}

impl PipelineState {
    /// Fresh state for a new generation run.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a stored `creation_params` document.
    ///
    /// ```
    /// use serde_json::json;
    /// use storybook_core::PipelineState;
    ///
    /// let state = PipelineState::from_value(json!({
    ///     "prompt": "A shy dragon", "pageCount": 28, "arc": {}, "bible": {}
    /// })).unwrap();
    /// assert_eq!(state.prompt, "A shy dragon");
    /// assert!(state.bible.is_none() && state.arc.is_none());
    /// ```
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let state: PipelineState = serde_json::from_value(value)
            .map_err(|e| ValidationError::new("creation_params", e.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    /// Serialize for storage, validating first.
    pub fn to_value(&self) -> Result<Value, ValidationError> {
        self.validate()?;
        serde_json::to_value(self)
            .map_err(|e| ValidationError::new("creation_params", e.to_string()))
    }
}

impl Validate for PipelineState {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(bible) = &self.bible {
            bible
                .validate()
                .map_err(|e| e.within("creation_params.bible"))?;
        }
        if let Some(arc) = &self.arc {
            arc.validate().map_err(|e| e.within("creation_params.arc"))?;
        }
        Ok(())
    }
}

mod empty_object {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            other => serde_json::from_value(other).map(Some).map_err(D::Error::custom),
        }
    }
}
