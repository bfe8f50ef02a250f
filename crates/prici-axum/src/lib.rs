//! Prici Axum Integration
//!
//! Axum middleware that enforces per-account usage quotas before a request
//! runs and records consumption after it succeeds.
//!
//! # Overview
//!
//! - **Gate**: resolves the `(account_id, field_id)` pair for a request, asks
//!   the quota service for the field state and either answers `402` or tags
//!   the request.
//! - **Recorder**: after a 2xx response, increments the tagged field once.
//!   Failures are logged and never reach the client.
//! - **Layer**: [`PriciLayer`] wires both hooks around any Axum service.
//!
//! # Quick Start
//!
//! ```ignore
//! use axum::error_handling::HandleErrorLayer;
//! use axum::{routing::post, Router};
//! use prici_axum::{handle_error, PriciLayer, PriciOptions};
//! use tower::ServiceBuilder;
//!
//! let options = PriciOptions::new(quota_service)
//!     .field_id("reports")
//!     .error_message("Report limit reached");
//!
//! let app = Router::new()
//!     .route("/api/reports", post(create_report))
//!     .layer(
//!         ServiceBuilder::new()
//!             .layer(HandleErrorLayer::new(handle_error))
//!             .layer(PriciLayer::new(options)),
//!     );
//! ```
//!
//! # Identity
//!
//! Without overrides, the account is taken from the first present of
//! [`AccountIdExt`], [`AccountExt`], [`UserExt::account`], [`UserExt::tenant`],
//! and the field from the static `field_id` or [`FieldIdExt`]. Requests with
//! no resolvable pair pass through unenforced.
//!
//! # Extractors
//!
//! - [`MaybeUsage`] - The pending usage tag, if any
//! - [`RequireUsage`] - The pending usage tag (500 if missing)
//!
//! # Features
//!
//! - `metrics` - Enable quota service call metrics in `prici-client` and
//!   re-export its `InstrumentedQuotaService` decorator

pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod identity;
pub mod layer;
pub mod usage;

// Re-export primary types
pub use config::{ConfigError, PriciConfig, PriciOptions, RecordMode, StaticOptions};
pub use context::{AccountExt, AccountIdExt, FieldIdExt, UsageTag, UserExt};
pub use error::{handle_error, GateError, QuotaDenied, UsageError};
pub use extractors::{MaybeUsage, RequireUsage};
pub use gate::{GateDecision, QuotaGate};
pub use identity::{resolve_identity, Identity, ResolveAmount, ResolveError, ResolveId};
pub use layer::{PriciFuture, PriciLayer, PriciService};
pub use usage::{is_success_class, RecordOutcome, UsageRecorder};

#[cfg(feature = "metrics")]
pub use prici_client::InstrumentedQuotaService;
