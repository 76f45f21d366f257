//! Story arc: three acts covering fourteen spreads.

use super::{OutputSchema, Validate, require_sequence, require_text};
use crate::{ACT_COUNT, SPREAD_COUNT};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storybook_error::ValidationError;

/// One act of the three-act structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Act {
    /// 1, 2 or 3
    pub act_number: i32,
    /// Short act title
    pub act_name: String,
    /// What happens in this act
    pub description: String,
    /// First spread of the act (inclusive)
    pub start_spread: i32,
    /// Last spread of the act (inclusive)
    pub end_spread: i32,
}

impl Act {
    /// Whether `spread` falls within this act.
    pub fn covers(&self, spread: i32) -> bool {
        (self.start_spread..=self.end_spread).contains(&spread)
    }
}

/// Narrative beat assigned to one spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ArcSpread {
    /// 1..=14
    pub spread_number: i32,
    /// Act this spread belongs to
    pub act_number: i32,
    /// Narrative description of the beat
    pub description: String,
}

/// Output of the arc stage, stored at `creation_params.arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StoryArc {
    /// Exactly three acts
    #[schemars(length(min = 3, max = 3))]
    pub acts: Vec<Act>,
    /// Exactly fourteen spreads
    #[schemars(length(min = 14, max = 14))]
    pub spreads: Vec<ArcSpread>,
}

impl OutputSchema for StoryArc {
    const NAME: &'static str = "story_arc";
}

impl Validate for StoryArc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_sequence("acts", "act_number", self.acts.iter().map(|a| a.act_number), ACT_COUNT)?;
        require_sequence(
            "spreads",
            "spread_number",
            self.spreads.iter().map(|s| s.spread_number),
            SPREAD_COUNT,
        )?;

        // Act ranges must partition 1..=14 in order.
        let mut next = 1;
        for (index, act) in self.acts.iter().enumerate() {
            require_text(&format!("acts[{}].act_name", index), &act.act_name)?;
            if act.start_spread != next {
                return Err(ValidationError::new(
                    format!("acts[{}].start_spread", index),
                    format!("expected {}, got {}", next, act.start_spread),
                ));
            }
            if act.end_spread < act.start_spread {
                return Err(ValidationError::new(
                    format!("acts[{}].end_spread", index),
                    format!("{} is before start_spread {}", act.end_spread, act.start_spread),
                ));
            }
            next = act.end_spread + 1;
        }
        if next != SPREAD_COUNT as i32 + 1 {
            return Err(ValidationError::new(
                format!("acts[{}].end_spread", ACT_COUNT - 1),
                format!("expected {}, got {}", SPREAD_COUNT, next - 1),
            ));
        }

        for (index, spread) in self.spreads.iter().enumerate() {
            let owner = self
                .acts
                .iter()
                .find(|act| act.covers(spread.spread_number))
                .map(|act| act.act_number);
            if owner != Some(spread.act_number) {
                return Err(ValidationError::new(
                    format!("spreads[{}].act_number", index),
                    format!(
                        "spread {} lies in act {}, got {}",
                        spread.spread_number,
                        owner.unwrap_or_default(),
                        spread.act_number
                    ),
                ));
            }
        }
        Ok(())
    }
}
