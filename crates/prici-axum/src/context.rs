//! Request attribute and usage tag types.
//!
//! Upstream middleware (authentication, tenancy resolution) inserts the
//! attribute extensions below into the request. The default identity
//! resolvers probe them in a fixed order; see [`crate::identity`].

/// Explicit account identifier attached to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdExt(pub String);

/// Account object attached to the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountExt {
    /// The account's identifier.
    pub id: Option<String>,
}

impl AccountExt {
    /// Create an account attribute with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }
}

/// Authenticated user attached to the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserExt {
    /// Account the user belongs to.
    pub account: Option<String>,
    /// Tenant the user belongs to.
    pub tenant: Option<String>,
}

impl UserExt {
    /// Create an empty user attribute.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user's account reference.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Set the user's tenant reference.
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }
}

/// Metered field identifier attached to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIdExt(pub String);

/// Usage tag linking a passed quota check to the later increment.
///
/// Created by the gate only when both identity components resolved and the
/// quota service allowed the request. It lives inside that request's
/// middleware future; a clone is also placed in the request extensions so
/// handlers can inspect it through [`crate::MaybeUsage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTag {
    /// Account the usage is charged to.
    pub account_id: String,
    /// Field the usage is charged against.
    pub field_id: String,
    /// Amount to increment by; `None` leaves it to the quota service.
    pub increment_amount: Option<u64>,
}

impl UsageTag {
    /// Create a tag without an explicit increment amount.
    #[must_use]
    pub fn new(account_id: impl Into<String>, field_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            field_id: field_id.into(),
            increment_amount: None,
        }
    }

    /// Set the increment amount.
    #[must_use]
    pub fn with_increment_amount(mut self, amount: Option<u64>) -> Self {
        self.increment_amount = amount;
        self
    }
}
