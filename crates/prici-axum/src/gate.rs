//! Pre-execution quota gate.

use std::sync::Arc;

use axum::http::request::Parts;

use crate::config::PriciConfig;
use crate::context::UsageTag;
use crate::error::{GateError, QuotaDenied};
use crate::identity::resolve_identity;

/// Outcome of the quota check for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// No account/field identity on the request; enforcement does not apply.
    Skip,
    /// Quota exhausted; the request ends with this response.
    Deny(QuotaDenied),
    /// Quota available; the handler runs and usage is recorded on success.
    Allow(UsageTag),
}

/// Queries entitlement state and decides whether a request may proceed.
///
/// The only side effect is the field state read; usage is not recorded here.
#[derive(Debug, Clone)]
pub struct QuotaGate {
    config: Arc<PriciConfig>,
}

impl QuotaGate {
    /// Create a gate over the shared configuration.
    #[must_use]
    pub fn new(config: Arc<PriciConfig>) -> Self {
        Self { config }
    }

    /// Run the check for a request.
    ///
    /// Errors from the quota service query are returned, not handled.
    pub async fn check(&self, parts: &Parts) -> Result<GateDecision, GateError> {
        let config = &self.config;

        let Some(identity) =
            resolve_identity(config.account_id.as_ref(), config.field_id.as_ref(), parts).await
        else {
            tracing::debug!(uri = %parts.uri, "No account/field identity, skipping quota check");
            return Ok(GateDecision::Skip);
        };

        let result = config
            .sdk
            .get_field_state(&identity.account_id, &identity.field_id)
            .await?;

        if !result.is_allowed {
            let message = config.error.resolve(parts, &result).await;
            tracing::info!(
                account_id = %identity.account_id,
                field_id = %identity.field_id,
                target_limit = result.state.target_limit,
                current_value = result.state.current_value,
                "Quota exhausted, denying request"
            );
            return Ok(GateDecision::Deny(QuotaDenied::new(message)));
        }

        let increment_amount = config.increment_amount.resolve(parts);
        tracing::debug!(
            account_id = %identity.account_id,
            field_id = %identity.field_id,
            remaining = result.state.remaining(),
            "Quota available"
        );

        Ok(GateDecision::Allow(
            UsageTag::new(identity.account_id, identity.field_id)
                .with_increment_amount(increment_amount),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::Request;
    use prici_client::{ClientError, QuotaService};
    use prici_types::{FieldState, FieldStateResult};

    use super::*;
    use crate::config::PriciOptions;
    use crate::context::{AccountIdExt, FieldIdExt};

    struct Fixed {
        allowed: bool,
        queries: AtomicUsize,
    }

    impl Fixed {
        fn new(allowed: bool) -> Arc<Self> {
            Arc::new(Self {
                allowed,
                queries: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QuotaService for Fixed {
        async fn get_field_state(&self, _: &str, _: &str) -> Result<FieldStateResult, ClientError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let state = FieldState::number(10, if self.allowed { 2 } else { 10 });
            Ok(FieldStateResult {
                is_allowed: self.allowed,
                state,
            })
        }

        async fn increment_field(&self, _: &str, _: &str, _: Option<u64>) -> Result<(), ClientError> {
            Ok(())
        }

        fn default_error_message(&self) -> &str {
            "service default"
        }
    }

    fn tagged_parts() -> Parts {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(AccountIdExt("acc".into()));
        parts.extensions.insert(FieldIdExt("calls".into()));
        parts
    }

    fn gate(options: PriciOptions) -> QuotaGate {
        QuotaGate::new(Arc::new(options.build()))
    }

    #[tokio::test]
    async fn test_skip_without_identity() {
        let sdk = Fixed::new(true);
        let gate = gate(PriciOptions::new(sdk.clone()));
        let (parts, ()) = Request::builder().body(()).unwrap().into_parts();

        assert_eq!(gate.check(&parts).await.unwrap(), GateDecision::Skip);
        assert_eq!(sdk.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_allow_tags_with_amount() {
        let sdk = Fixed::new(true);
        let gate = gate(PriciOptions::new(sdk.clone()).increment_amount(3));

        let decision = gate.check(&tagged_parts()).await.unwrap();
        assert_eq!(
            decision,
            GateDecision::Allow(UsageTag::new("acc", "calls").with_increment_amount(Some(3)))
        );
        assert_eq!(sdk.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deny_message_precedence() {
        let parts = tagged_parts();

        let decision = gate(PriciOptions::new(Fixed::new(false))).check(&parts).await.unwrap();
        assert_eq!(decision, GateDecision::Deny(QuotaDenied::new("service default")));

        let decision = gate(PriciOptions::new(Fixed::new(false)).error_message("static"))
            .check(&parts)
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::Deny(QuotaDenied::new("static")));

        let decision = gate(
            PriciOptions::new(Fixed::new(false))
                .error_message("static")
                .get_error(|_: &Parts, result: &FieldStateResult| {
                    format!("limit of {} reached", result.state.target_limit)
                }),
        )
        .check(&parts)
        .await
        .unwrap();
        assert_eq!(decision, GateDecision::Deny(QuotaDenied::new("limit of 10 reached")));
    }

    #[tokio::test]
    async fn test_amount_override_beats_static() {
        let gate = gate(
            PriciOptions::new(Fixed::new(true))
                .increment_amount(3)
                .get_increment_amount(|_: &Parts| Some(7_u64)),
        );

        match gate.check(&tagged_parts()).await.unwrap() {
            GateDecision::Allow(tag) => assert_eq!(tag.increment_amount, Some(7)),
            other => panic!("expected allow, got {other:?}"),
        }
    }
}
