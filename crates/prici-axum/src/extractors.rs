//! Axum extractors for the pending usage tag.
//!
//! Handlers behind [`crate::PriciLayer`] can look at the account, field and
//! amount that will be charged if they succeed.
//!
//! # Usage
//!
//! ```ignore
//! use prici_axum::{MaybeUsage, RequireUsage};
//!
//! async fn report(usage: RequireUsage) -> String {
//!     format!("charging {} on {}", usage.account_id, usage.field_id)
//! }
//!
//! async fn public(usage: MaybeUsage) -> String {
//!     match usage.0 {
//!         Some(tag) => format!("metered for {}", tag.account_id),
//!         None => "not metered".to_string(),
//!     }
//! }
//! ```

use std::ops::Deref;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::context::UsageTag;
use crate::error::UsageError;

/// Extractor for an optional usage tag.
///
/// `None` when enforcement was skipped for this request.
#[derive(Debug, Clone)]
pub struct MaybeUsage(pub Option<UsageTag>);

impl Deref for MaybeUsage {
    type Target = Option<UsageTag>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUsage
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<UsageTag>().cloned()))
    }
}

/// Extractor that requires a usage tag.
///
/// Rejects with 500 if the route is not behind the quota layer or the
/// request carried no identity, since that is a routing mistake.
#[derive(Debug, Clone)]
pub struct RequireUsage(pub UsageTag);

impl Deref for RequireUsage {
    type Target = UsageTag;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireUsage
where
    S: Send + Sync,
{
    type Rejection = UsageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UsageTag>()
            .cloned()
            .map(Self)
            .ok_or(UsageError::MissingTag)
    }
}
