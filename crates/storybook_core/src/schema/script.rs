//! Final script: fourteen spreads of left/right page text.

use super::{OutputSchema, Validate, require_sequence, require_text};
use crate::{SPREAD_COUNT, spread_pages};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storybook_error::ValidationError;

/// Text for one spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SpreadScript {
    /// 1..=14
    pub spread_number: i32,
    /// Left page text
    pub script_1: String,
    /// Right page text
    pub script_2: String,
}

/// Draft or rewritten script for a storybook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FinalScript {
    /// Storybook the script belongs to
    pub storybook_id: String,
    /// Owning user
    pub user_id: String,
    /// Exactly fourteen spreads, numbered 1..=14
    #[schemars(length(min = 14, max = 14))]
    pub spreads: Vec<SpreadScript>,
}

impl FinalScript {
    /// Page number and text for every page, in reading order.
    ///
    /// Spread `n` yields pages `2n-1` (left, `script_1`) and `2n` (right, `script_2`).
    pub fn page_texts(&self) -> Vec<(i32, &str)> {
        self.spreads
            .iter()
            .flat_map(|spread| {
                let (left, right) = spread_pages(spread.spread_number);
                [(left, spread.script_1.as_str()), (right, spread.script_2.as_str())]
            })
            .collect()
    }
}

fn validate_spreads(spreads: &[SpreadScript]) -> Result<(), ValidationError> {
    require_sequence(
        "spreads",
        "spread_number",
        spreads.iter().map(|s| s.spread_number),
        SPREAD_COUNT,
    )
}

impl OutputSchema for FinalScript {
    const NAME: &'static str = "final_script";
}

impl Validate for FinalScript {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_spreads(&self.spreads)
    }
}

/// Rewritten script plus a summary of what changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FinalRewrite {
    /// Storybook the script belongs to
    pub storybook_id: String,
    /// Owning user
    pub user_id: String,
    /// Exactly fourteen spreads, numbered 1..=14
    #[schemars(length(min = 14, max = 14))]
    pub spreads: Vec<SpreadScript>,
    /// Human-readable description of the edit
    pub change_summary: String,
}

impl FinalRewrite {
    /// Split into the script and its change summary.
    pub fn into_parts(self) -> (FinalScript, String) {
        (
            FinalScript {
                storybook_id: self.storybook_id,
                user_id: self.user_id,
                spreads: self.spreads,
            },
            self.change_summary,
        )
    }
}

impl OutputSchema for FinalRewrite {
    const NAME: &'static str = "final_rewrite";
}

impl Validate for FinalRewrite {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_spreads(&self.spreads)?;
        require_text("change_summary", &self.change_summary)
    }
}
