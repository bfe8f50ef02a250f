//! Prici Client - quota service boundary
//!
//! Defines the [`QuotaService`] trait through which the interception layer
//! reads entitlement state and records consumption. Storage, limits and
//! refill policy all live behind this trait.

pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod service;

pub use error::ClientError;
#[cfg(feature = "metrics")]
pub use metrics::InstrumentedQuotaService;
pub use service::{QuotaService, SharedQuotaService, DEFAULT_ERROR_MESSAGE};
