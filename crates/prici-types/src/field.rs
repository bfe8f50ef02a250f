//! Field state and entitlement check types

use serde::{Deserialize, Serialize};

/// Kind of metered field.
///
/// Only [`FieldKind::Number`] carries counter semantics that matter to the
/// interception layer; every other kind is passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Numeric counter with a target limit
    #[default]
    Number,
    /// On/off feature flag
    Boolean,
    /// Any kind this crate does not know about
    #[serde(other)]
    Unknown,
}

impl FieldKind {
    /// Get the wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current state of a field for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    /// Limit the account may consume
    pub target_limit: u64,
    /// Kind of field
    pub kind: FieldKind,
    /// Amount consumed so far
    pub current_value: u64,
}

impl FieldState {
    /// Create a numeric counter state
    pub const fn number(target_limit: u64, current_value: u64) -> Self {
        Self {
            target_limit,
            kind: FieldKind::Number,
            current_value,
        }
    }

    /// Remaining amount before the limit is reached
    pub fn remaining(&self) -> u64 {
        self.target_limit.saturating_sub(self.current_value)
    }
}

/// Field state query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStateResult {
    /// Whether the account may proceed
    pub is_allowed: bool,
    /// State the decision was based on
    pub state: FieldState,
}

impl FieldStateResult {
    /// An allowing result
    pub const fn allowed(state: FieldState) -> Self {
        Self {
            is_allowed: true,
            state,
        }
    }

    /// A denying result
    pub const fn denied(state: FieldState) -> Self {
        Self {
            is_allowed: false,
            state,
        }
    }
}
