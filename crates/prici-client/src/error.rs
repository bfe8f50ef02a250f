//! Quota service errors.

use std::time::Duration;

/// Errors returned by a [`crate::QuotaService`] implementation.
///
/// The layer never retries; every variant is reported once and dropped or
/// propagated depending on where it happened.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The quota service could not be reached.
    #[error("failed to reach quota service: {0}")]
    Transport(String),

    /// No answer arrived within the client's deadline.
    #[error("quota service did not answer within {0:?}")]
    Timeout(Duration),

    /// The account has no such metered field.
    #[error("unknown field {field_id} for account {account_id}")]
    UnknownField { account_id: String, field_id: String },

    /// The quota service refused the call, e.g. a negative or zero amount.
    #[error("quota service rejected the request: {0}")]
    Rejected(String),

    /// The quota service is up but not serving, e.g. during a deploy.
    #[error("quota service unavailable: {0}")]
    Unavailable(String),

    /// The quota service hit an error of its own.
    #[error("quota service failed: {0}")]
    Internal(String),

    /// The field state payload did not match the expected shape.
    #[error("malformed quota service payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn unknown_field(account_id: impl Into<String>, field_id: impl Into<String>) -> Self {
        Self::UnknownField {
            account_id: account_id.into(),
            field_id: field_id.into(),
        }
    }

    /// Stable label for log fields and metric tags.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::UnknownField { .. } => "unknown_field",
            Self::Rejected(_) => "rejected",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal",
            Self::Decode(_) => "decode",
        }
    }
}
