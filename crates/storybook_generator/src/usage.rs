//! Advisory usage recording.

use std::sync::Arc;
use storybook_interface::UsageLedger;
use tracing::instrument;

/// Attributes token usage to users.
///
/// Recording never fails the caller: a ledger error is logged and dropped.
#[derive(Clone)]
pub struct UsageRecorder {
    ledger: Arc<dyn UsageLedger>,
}

impl std::fmt::Debug for UsageRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageRecorder").finish_non_exhaustive()
    }
}

impl UsageRecorder {
    /// Record into `ledger`.
    pub fn new(ledger: Arc<dyn UsageLedger>) -> Self {
        Self { ledger }
    }

    /// Add `total_tokens` to the user's usage.
    ///
    /// No-op when there is no user or nothing to bill.
    #[instrument(skip(self))]
    pub async fn record(&self, user_id: Option<&str>, total_tokens: i64) {
        let Some(user_id) = user_id.map(str::trim).filter(|id| !id.is_empty()) else {
            tracing::debug!("No user to bill, skipping usage");
            return;
        };
        if total_tokens <= 0 {
            tracing::debug!("No tokens to bill, skipping usage");
            return;
        }
        match self.ledger.increment_credits_used(user_id, total_tokens).await {
            Ok(()) => tracing::debug!("Usage recorded"),
            Err(e) => tracing::warn!(error = %e, "Failed to record usage"),
        }
    }
}
