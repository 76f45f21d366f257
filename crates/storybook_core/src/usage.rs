//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token usage for a single oracle call.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct TokenUsage {
    /// Tokens in the prompt
    input_tokens: i64,
    /// Tokens in the response
    output_tokens: i64,
}

impl TokenUsage {
    /// Create a usage record.
    pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total billable tokens.
    pub fn total(&self) -> i64 {
        self.input_tokens + self.output_tokens
    }

    /// Rough usage for providers that omit counts: one token per four
    /// characters, at least one for non-empty text.
    ///
    /// ```
    /// use storybook_core::TokenUsage;
    ///
    /// let usage = TokenUsage::estimate("abcdefghi", "");
    /// assert_eq!(*usage.input_tokens(), 3);
    /// assert_eq!(*usage.output_tokens(), 0);
    /// assert_eq!(TokenUsage::estimate("a", "ab").total(), 2);
    /// ```
    pub fn estimate(prompt: &str, completion: &str) -> Self {
        Self::new(estimate_tokens(prompt), estimate_tokens(completion))
    }
}

impl std::ops::Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, other: TokenUsage) -> TokenUsage {
        TokenUsage::new(
            self.input_tokens + other.input_tokens,
            self.output_tokens + other.output_tokens,
        )
    }
}

fn estimate_tokens(text: &str) -> i64 {
    let chars = text.chars().count() as i64;
    if chars == 0 { 0 } else { (chars + 3) / 4 }
}
