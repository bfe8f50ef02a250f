//! Identity resolution.
//!
//! Every request is charged against an `(account_id, field_id)` pair. Each
//! component comes either from an override supplied at registration or from
//! a default that probes typed request attributes in a fixed order.
//!
//! Resolvers receive the request [`Parts`] rather than the full request so
//! their futures stay `Send` while the body is parked by the middleware.
//!
//! Plain closures over `&Parts` implement the resolver traits directly:
//!
//! ```ignore
//! let options = PriciOptions::new(sdk)
//!     .get_account_id(|parts: &Parts| {
//!         parts.headers.get("x-account").and_then(|v| v.to_str().ok()).map(String::from)
//!     });
//! ```
//!
//! Resolvers that need to await something implement the trait on their own
//! type instead.

use async_trait::async_trait;
use axum::http::request::Parts;
use prici_types::FieldStateResult;

use crate::context::{AccountExt, AccountIdExt, FieldIdExt, UserExt};

/// Resolves one identity component for a request.
#[async_trait]
pub trait ResolveId: Send + Sync {
    /// Return the identifier, or `None` when the request does not carry one.
    async fn resolve(&self, parts: &Parts) -> Option<String>;
}

#[async_trait]
impl<F> ResolveId for F
where
    F: Fn(&Parts) -> Option<String> + Send + Sync,
{
    async fn resolve(&self, parts: &Parts) -> Option<String> {
        self(parts)
    }
}

/// Resolves the message returned with a denied request.
#[async_trait]
pub trait ResolveError: Send + Sync {
    /// Build the message from the request and the denying field state.
    async fn resolve(&self, parts: &Parts, result: &FieldStateResult) -> String;
}

#[async_trait]
impl<F> ResolveError for F
where
    F: Fn(&Parts, &FieldStateResult) -> String + Send + Sync,
{
    async fn resolve(&self, parts: &Parts, result: &FieldStateResult) -> String {
        self(parts, result)
    }
}

/// Resolves the increment amount for an allowed request.
pub trait ResolveAmount: Send + Sync {
    /// Return the amount, or `None` to let the quota service decide.
    fn resolve(&self, parts: &Parts) -> Option<u64>;
}

impl<F> ResolveAmount for F
where
    F: Fn(&Parts) -> Option<u64> + Send + Sync,
{
    fn resolve(&self, parts: &Parts) -> Option<u64> {
        self(parts)
    }
}

type Accessor = fn(&Parts) -> Option<&str>;

fn explicit_account_id(parts: &Parts) -> Option<&str> {
    parts
        .extensions
        .get::<AccountIdExt>()
        .map(|ext| ext.0.as_str())
}

fn account_object_id(parts: &Parts) -> Option<&str> {
    parts
        .extensions
        .get::<AccountExt>()
        .and_then(|account| account.id.as_deref())
}

fn user_account(parts: &Parts) -> Option<&str> {
    parts
        .extensions
        .get::<UserExt>()
        .and_then(|user| user.account.as_deref())
}

fn user_tenant(parts: &Parts) -> Option<&str> {
    parts
        .extensions
        .get::<UserExt>()
        .and_then(|user| user.tenant.as_deref())
}

/// Account attributes in priority order.
const ACCOUNT_ID_CHAIN: [Accessor; 4] = [
    explicit_account_id,
    account_object_id,
    user_account,
    user_tenant,
];

/// Default account resolver.
///
/// Tries, in order: [`AccountIdExt`], [`AccountExt::id`], [`UserExt::account`],
/// [`UserExt::tenant`]. Empty strings count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAccountId;

impl DefaultAccountId {
    fn first_present(parts: &Parts) -> Option<String> {
        ACCOUNT_ID_CHAIN
            .iter()
            .find_map(|get| get(parts).filter(|value| !value.is_empty()))
            .map(str::to_owned)
    }
}

#[async_trait]
impl ResolveId for DefaultAccountId {
    async fn resolve(&self, parts: &Parts) -> Option<String> {
        Self::first_present(parts)
    }
}

/// Default field resolver: the statically configured field id, else [`FieldIdExt`].
#[derive(Debug, Clone, Default)]
pub struct DefaultFieldId {
    field_id: Option<String>,
}

impl DefaultFieldId {
    /// Create a resolver with an optional static field id.
    #[must_use]
    pub fn new(field_id: Option<String>) -> Self {
        Self {
            field_id: field_id.filter(|id| !id.is_empty()),
        }
    }
}

#[async_trait]
impl ResolveId for DefaultFieldId {
    async fn resolve(&self, parts: &Parts) -> Option<String> {
        self.field_id.clone().or_else(|| {
            parts
                .extensions
                .get::<FieldIdExt>()
                .map(|ext| ext.0.clone())
                .filter(|id| !id.is_empty())
        })
    }
}

/// Default deny message: a fixed string chosen at registration.
#[derive(Debug, Clone)]
pub struct StaticErrorMessage(pub String);

#[async_trait]
impl ResolveError for StaticErrorMessage {
    async fn resolve(&self, _parts: &Parts, _result: &FieldStateResult) -> String {
        self.0.clone()
    }
}

/// Default increment amount: a fixed value chosen at registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAmount(pub Option<u64>);

impl ResolveAmount for StaticAmount {
    fn resolve(&self, _parts: &Parts) -> Option<u64> {
        self.0
    }
}

/// Resolved identity pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account to charge.
    pub account_id: String,
    /// Field to charge against.
    pub field_id: String,
}

/// Resolve both identity components concurrently.
///
/// Returns `None` when either component is missing or empty, meaning the
/// request is not subject to quota enforcement.
pub async fn resolve_identity(
    account: &dyn ResolveId,
    field: &dyn ResolveId,
    parts: &Parts,
) -> Option<Identity> {
    let (account_id, field_id) = futures::join!(account.resolve(parts), field.resolve(parts));

    match (non_empty(account_id), non_empty(field_id)) {
        (Some(account_id), Some(field_id)) => Some(Identity {
            account_id,
            field_id,
        }),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use futures::executor::block_on;

    fn parts() -> Parts {
        Request::builder().body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_account_chain_priority() {
        let mut parts = parts();
        parts.extensions.insert(UserExt::new().with_account("user_acc").with_tenant("tenant"));
        assert_eq!(block_on(DefaultAccountId.resolve(&parts)).as_deref(), Some("user_acc"));

        parts.extensions.insert(AccountExt::new("account_obj"));
        assert_eq!(block_on(DefaultAccountId.resolve(&parts)).as_deref(), Some("account_obj"));

        parts.extensions.insert(AccountIdExt("explicit".into()));
        assert_eq!(block_on(DefaultAccountId.resolve(&parts)).as_deref(), Some("explicit"));
    }

    #[test]
    fn test_account_chain_skips_empty() {
        let mut parts = parts();
        parts.extensions.insert(AccountIdExt(String::new()));
        parts.extensions.insert(UserExt::new().with_tenant("tenant"));

        assert_eq!(block_on(DefaultAccountId.resolve(&parts)).as_deref(), Some("tenant"));
    }

    #[test]
    fn test_field_static_wins_over_attribute() {
        let mut parts = parts();
        parts.extensions.insert(FieldIdExt("from_request".into()));

        let static_field = DefaultFieldId::new(Some("static".into()));
        assert_eq!(block_on(static_field.resolve(&parts)).as_deref(), Some("static"));

        let dynamic_field = DefaultFieldId::new(None);
        assert_eq!(block_on(dynamic_field.resolve(&parts)).as_deref(), Some("from_request"));
    }

    #[test]
    fn test_identity_requires_both() {
        let mut parts = parts();
        parts.extensions.insert(AccountIdExt("acc".into()));

        let field = DefaultFieldId::new(None);
        assert!(block_on(resolve_identity(&DefaultAccountId, &field, &parts)).is_none());

        parts.extensions.insert(FieldIdExt("f".into()));
        let identity = block_on(resolve_identity(&DefaultAccountId, &field, &parts)).unwrap();
        assert_eq!(identity.account_id, "acc");
        assert_eq!(identity.field_id, "f");
    }

    #[test]
    fn test_closure_resolvers() {
        let parts = parts();
        let empty = |_: &Parts| Some(String::new());
        let fixed = |_: &Parts| Some("acc".to_string());

        assert!(block_on(resolve_identity(&fixed, &empty, &parts)).is_none());

        let amount = |_: &Parts| Some(5_u64);
        assert_eq!(ResolveAmount::resolve(&amount, &parts), Some(5));
    }
}
