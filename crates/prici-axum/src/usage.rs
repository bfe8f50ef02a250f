//! Post-execution usage recording.
//!
//! Once a response has been produced, the recorder charges the tagged
//! account exactly once, and only for successful responses. The response is
//! already committed at that point, so an increment failure is logged and
//! dropped here; nothing propagates back into the response path and nothing
//! is retried.

use axum::http::StatusCode;
use prici_client::SharedQuotaService;

use crate::context::UsageTag;

/// Whether a status belongs to the success class (200..=299).
#[must_use]
pub fn is_success_class(status: StatusCode) -> bool {
    (200..=299).contains(&status.as_u16())
}

/// What the recorder did for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Non-success status or untagged request; nothing was sent.
    Skipped,
    /// The increment call succeeded.
    Recorded,
    /// The increment call failed and was logged.
    Failed,
}

/// Records usage against the quota service.
#[derive(Clone)]
pub struct UsageRecorder {
    sdk: SharedQuotaService,
}

impl UsageRecorder {
    /// Create a recorder with the given quota service client.
    #[must_use]
    pub fn new(sdk: SharedQuotaService) -> Self {
        Self { sdk }
    }

    /// Record usage for a finished request.
    ///
    /// Never fails: increment errors are logged once at error level.
    pub async fn record(&self, status: StatusCode, tag: Option<UsageTag>) -> RecordOutcome {
        let Some(tag) = tag.filter(|_| is_success_class(status)) else {
            return RecordOutcome::Skipped;
        };

        match self
            .sdk
            .increment_field(&tag.account_id, &tag.field_id, tag.increment_amount)
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    account_id = %tag.account_id,
                    field_id = %tag.field_id,
                    amount = ?tag.increment_amount,
                    "Recorded usage"
                );
                RecordOutcome::Recorded
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    account_id = %tag.account_id,
                    field_id = %tag.field_id,
                    amount = ?tag.increment_amount,
                    "Failed to increment field"
                );
                RecordOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for UsageRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageRecorder").finish_non_exhaustive()
    }
}
