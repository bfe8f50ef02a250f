//! In-memory quota service for testing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use prici_client::{ClientError, QuotaService};
use prici_types::{FieldState, FieldStateResult};

/// One recorded increment call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    pub account_id: String,
    pub field_id: String,
    pub amount: Option<u64>,
}

/// Quota service double that answers a fixed decision and counts calls
#[derive(Default)]
pub struct MockQuotaService {
    denied: bool,
    fail_query: bool,
    fail_increment: bool,
    hang_increment: bool,
    default_message: Option<String>,
    queries: DashMap<(String, String), usize>,
    query_calls: AtomicUsize,
    increments: Mutex<Vec<Increment>>,
}

#[allow(dead_code)]
impl MockQuotaService {
    /// Service that allows every query
    pub fn allowing() -> Self {
        Self::default()
    }

    /// Service that denies every query
    pub fn denying() -> Self {
        Self {
            denied: true,
            ..Self::default()
        }
    }

    /// Make every field state query fail
    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    /// Make every increment fail
    pub fn failing_increment(mut self) -> Self {
        self.fail_increment = true;
        self
    }

    /// Make every increment record the call and then never complete
    pub fn hanging_increment(mut self) -> Self {
        self.hang_increment = true;
        self
    }

    /// Override the service default deny message
    pub fn with_default_message(mut self, message: &str) -> Self {
        self.default_message = Some(message.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of queries for one identity pair
    pub fn queries_for(&self, account_id: &str, field_id: &str) -> usize {
        self.queries
            .get(&(account_id.to_string(), field_id.to_string()))
            .map(|count| *count.value())
            .unwrap_or(0)
    }

    pub fn increments(&self) -> Vec<Increment> {
        self.increments.lock().unwrap().clone()
    }

    pub fn increment_count(&self) -> usize {
        self.increments.lock().unwrap().len()
    }

    /// Yield to spawned recorders until `expected` increments arrived or
    /// the attempts run out, then return the count seen.
    pub async fn settled_increments(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.increment_count() >= expected {
                break;
            }
            tokio::task::yield_now().await;
        }
        self.increment_count()
    }
}

#[async_trait]
impl QuotaService for MockQuotaService {
    async fn get_field_state(
        &self,
        account_id: &str,
        field_id: &str,
    ) -> Result<FieldStateResult, ClientError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .queries
            .entry((account_id.to_string(), field_id.to_string()))
            .or_insert(0) += 1;

        if self.fail_query {
            return Err(ClientError::Unavailable("quota service down".to_string()));
        }

        Ok(if self.denied {
            FieldStateResult::denied(FieldState::number(1, 1))
        } else {
            FieldStateResult::allowed(FieldState::number(1, 0))
        })
    }

    async fn increment_field(
        &self,
        account_id: &str,
        field_id: &str,
        amount: Option<u64>,
    ) -> Result<(), ClientError> {
        self.increments.lock().unwrap().push(Increment {
            account_id: account_id.to_string(),
            field_id: field_id.to_string(),
            amount,
        });

        if self.hang_increment {
            std::future::pending::<()>().await;
        }

        if self.fail_increment {
            return Err(ClientError::Internal("Increment error".to_string()));
        }
        Ok(())
    }

    fn default_error_message(&self) -> &str {
        self.default_message
            .as_deref()
            .unwrap_or(prici_client::DEFAULT_ERROR_MESSAGE)
    }
}
