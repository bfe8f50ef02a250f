//! Client metrics for observability.
//!
//! Provides Prometheus-compatible metrics for monitoring quota service calls.
//!
//! # Metrics
//!
//! - `prici_client_requests_total` - Counter of calls by operation and status
//!   (`success` or the error kind, e.g. `timeout`)
//! - `prici_client_request_duration_seconds` - Histogram of call latencies
//!
//! # Usage
//!
//! Metrics are recorded through the `metrics` facade and are no-ops until a
//! recorder such as `metrics-exporter-prometheus` is installed.
//!
//! ```ignore
//! use prici_client::InstrumentedQuotaService;
//!
//! let sdk: SharedQuotaService = Arc::new(InstrumentedQuotaService::new(my_service));
//! ```

use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use prici_types::FieldStateResult;

use crate::{ClientError, QuotaService};

/// Metric name for total requests.
pub const REQUESTS_TOTAL: &str = "prici_client_requests_total";

/// Metric name for request duration histogram.
pub const REQUEST_DURATION_SECONDS: &str = "prici_client_request_duration_seconds";

/// Quota service operations for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetFieldState,
    IncrementField,
}

impl Operation {
    /// Get the operation name as a string for metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetFieldState => "get_field_state",
            Self::IncrementField => "increment_field",
        }
    }
}

/// Status label for a finished call: `success`, or the error's [`ClientError::kind`].
pub fn status_label<T>(result: &Result<T, ClientError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    }
}

/// Record a completed quota service call.
pub fn record_request(operation: Operation, status: &'static str, duration_seconds: f64) {
    counter!(
        REQUESTS_TOTAL,
        "operation" => operation.as_str(),
        "status" => status
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "operation" => operation.as_str()
    )
    .record(duration_seconds);
}

/// Quota service decorator that records one metric sample per call.
///
/// Results and errors are forwarded unchanged.
#[derive(Debug, Clone)]
pub struct InstrumentedQuotaService<Q> {
    inner: Q,
}

impl<Q> InstrumentedQuotaService<Q> {
    /// Wrap a quota service.
    pub fn new(inner: Q) -> Self {
        Self { inner }
    }

    /// Get the wrapped service.
    pub fn inner(&self) -> &Q {
        &self.inner
    }
}

#[async_trait]
impl<Q> QuotaService for InstrumentedQuotaService<Q>
where
    Q: QuotaService,
{
    async fn get_field_state(
        &self,
        account_id: &str,
        field_id: &str,
    ) -> Result<FieldStateResult, ClientError> {
        let start = Instant::now();
        let result = self.inner.get_field_state(account_id, field_id).await;
        record_request(
            Operation::GetFieldState,
            status_label(&result),
            start.elapsed().as_secs_f64(),
        );
        result
    }

    async fn increment_field(
        &self,
        account_id: &str,
        field_id: &str,
        amount: Option<u64>,
    ) -> Result<(), ClientError> {
        let start = Instant::now();
        let result = self.inner.increment_field(account_id, field_id, amount).await;
        record_request(
            Operation::IncrementField,
            status_label(&result),
            start.elapsed().as_secs_f64(),
        );
        result
    }

    fn default_error_message(&self) -> &str {
        self.inner.default_error_message()
    }
}
