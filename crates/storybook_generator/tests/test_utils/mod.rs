//! Test utilities for storybook generator tests.
//!
//! Scripted oracles, a recording usage ledger and fixture builders.

pub mod fixtures;
pub mod mock_oracle;

#[allow(unused_imports)]
pub use fixtures::{
    arc_json, bible_json, character, classification_json, rewrite_json, script, script_json,
    setting_json,
};
#[allow(unused_imports)]
pub use mock_oracle::{MockImages, MockOracle, MockResponse, RecordedCall, RecordingUsage};
