//! Stage schemas and the validation boundary for structured data.
//!
//! Every artifact that crosses a stage boundary (oracle output, request
//! body, persisted creation parameters) enters the system as a raw
//! [`serde_json::Value`] and leaves this module either as a typed value
//! that satisfies its invariants or as a [`ValidationError`] naming the
//! offending field.

mod arc;
mod bible;
mod classification;
mod script;
mod strict;

pub use arc::{Act, ArcSpread, StoryArc};
pub use bible::{BibleCharacter, SettingOnly, StoryBible};
pub use classification::{ChatAction, Classification};
pub use script::{FinalRewrite, FinalScript, SpreadScript};

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use storybook_error::ValidationError;

/// A type whose derived JSON Schema is sent as a structured-output format.
///
/// The document comes from the [`JsonSchema`] derive, rewritten into the
/// closed form strict structured-output modes expect: every object has
/// `additionalProperties: false` and lists all of its properties as required.
pub trait OutputSchema: JsonSchema {
    /// Schema name reported to the provider.
    const NAME: &'static str;

    /// The strict JSON Schema document.
    fn output_schema() -> Value {
        strict::strict_schema::<Self>()
    }
}

/// Invariants beyond shape: ordering, numbering, cross-field consistency.
pub trait Validate {
    /// Check the value's invariants.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Validate raw structured data and convert it into `T`.
///
/// Shape is enforced by deserialization (every stage type rejects unknown
/// fields) with the failing field's path recorded, then [`Validate::validate`] checks counts, numbering and
/// cross-field consistency.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use storybook_core::{validate_value, Classification, ChatAction};
///
/// let parsed: Classification = validate_value(json!({ "action": "edit" })).unwrap();
/// assert_eq!(parsed.action, ChatAction::Edit);
///
/// let err = validate_value::<Classification>(json!({ "action": "rewrite" })).unwrap_err();
/// assert_eq!(err.path, "action");
/// ```
pub fn validate_value<T>(value: Value) -> Result<T, ValidationError>
where
    T: OutputSchema + Validate + DeserializeOwned,
{
    let parsed: T = serde_path_to_error::deserialize(value).map_err(|e| {
        let path = match e.path().to_string() {
            root if root == "." => "$".to_string(),
            path => path,
        };
        ValidationError::new(path, format!("{}: {}", T::NAME, e.inner()))
    })?;
    parsed.validate()?;
    Ok(parsed)
}

pub(crate) fn require_text(path: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(path, "must not be blank"))
    } else {
        Ok(())
    }
}

/// Check that `numbers` is exactly `1..=expected`, in order.
pub(crate) fn require_sequence(
    collection: &str,
    field: &str,
    numbers: impl Iterator<Item = i32>,
    expected: usize,
) -> Result<(), ValidationError> {
    let mut count = 0usize;
    for (index, number) in numbers.enumerate() {
        count += 1;
        if number != index as i32 + 1 {
            return Err(ValidationError::new(
                format!("{}[{}].{}", collection, index, field),
                format!("expected {}, got {}", index + 1, number),
            ));
        }
    }
    if count != expected {
        return Err(ValidationError::new(
            collection,
            format!("expected exactly {} items, got {}", expected, count),
        ));
    }
    Ok(())
}
