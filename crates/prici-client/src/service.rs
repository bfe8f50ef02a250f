//! Quota service trait

use std::sync::Arc;

use async_trait::async_trait;
use prici_types::FieldStateResult;

use crate::ClientError;

/// Message used for denied requests when nothing more specific is configured.
pub const DEFAULT_ERROR_MESSAGE: &str = "Usage limit reached for this account";

/// External quota service.
///
/// Implementations own entitlement storage and arithmetic. They must be
/// safe to call concurrently from many in-flight requests; callers perform
/// no locking, batching or retrying.
#[async_trait]
pub trait QuotaService: Send + Sync {
    /// Read the current entitlement state of `field_id` for `account_id`.
    async fn get_field_state(
        &self,
        account_id: &str,
        field_id: &str,
    ) -> Result<FieldStateResult, ClientError>;

    /// Record consumption against a field.
    ///
    /// `None` leaves the amount to the service's default.
    async fn increment_field(
        &self,
        account_id: &str,
        field_id: &str,
        amount: Option<u64>,
    ) -> Result<(), ClientError>;

    /// Message returned to callers when a request is denied.
    fn default_error_message(&self) -> &str {
        DEFAULT_ERROR_MESSAGE
    }
}

/// Shared handle to a quota service.
pub type SharedQuotaService = Arc<dyn QuotaService>;

#[async_trait]
impl<Q> QuotaService for Arc<Q>
where
    Q: QuotaService + ?Sized,
{
    async fn get_field_state(
        &self,
        account_id: &str,
        field_id: &str,
    ) -> Result<FieldStateResult, ClientError> {
        (**self).get_field_state(account_id, field_id).await
    }

    async fn increment_field(
        &self,
        account_id: &str,
        field_id: &str,
        amount: Option<u64>,
    ) -> Result<(), ClientError> {
        (**self).increment_field(account_id, field_id, amount).await
    }

    fn default_error_message(&self) -> &str {
        (**self).default_error_message()
    }
}
