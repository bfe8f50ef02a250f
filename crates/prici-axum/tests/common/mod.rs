//! Common test utilities for prici-axum integration tests

pub mod log_capture;
pub mod mock_quota;

#[allow(unused_imports)]
pub use log_capture::{capture_errors, ErrorEvents};
#[allow(unused_imports)]
pub use mock_quota::{Increment, MockQuotaService};
