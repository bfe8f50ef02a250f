//! Layer configuration.
//!
//! [`PriciOptions`] is the registration surface: the quota service plus
//! optional static values and resolver overrides. [`PriciOptions::build`]
//! turns it into an immutable [`PriciConfig`] by starting from a defaults
//! struct and replacing each field for which an override was supplied.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use prici_client::SharedQuotaService;

use crate::identity::{
    DefaultAccountId, DefaultFieldId, ResolveAmount, ResolveError, ResolveId, StaticAmount,
    StaticErrorMessage,
};

/// When the usage increment runs relative to response delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordMode {
    /// Spawn the increment onto the tokio runtime and return the response
    /// immediately. Delivery never waits on the quota service.
    #[default]
    Detached,
    /// Await the increment before the response leaves the middleware.
    ///
    /// A slow or hung `increment_field` holds back every successful
    /// response for as long as it takes.
    Inline,
}

impl FromStr for RecordMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "detached" => Ok(Self::Detached),
            _ => Err(ConfigError::Invalid("PRICI_RECORD_MODE")),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    Invalid(&'static str),
}

/// Static options that can be supplied through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticOptions {
    /// Static field identifier (`PRICI_FIELD_ID`).
    pub field_id: Option<String>,
    /// Static deny message (`PRICI_ERROR_MESSAGE`).
    pub error_message: Option<String>,
    /// Static increment amount (`PRICI_INCREMENT_AMOUNT`).
    pub increment_amount: Option<u64>,
    /// Record mode (`PRICI_RECORD_MODE`: `inline` or `detached`).
    pub record_mode: Option<RecordMode>,
}

impl StaticOptions {
    /// Load static options from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load static options through an arbitrary key lookup.
    ///
    /// Unset and empty values are treated alike.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let increment_amount = get("PRICI_INCREMENT_AMOUNT")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("PRICI_INCREMENT_AMOUNT"))
            })
            .transpose()?;

        let record_mode = get("PRICI_RECORD_MODE")
            .map(|raw| raw.trim().parse::<RecordMode>())
            .transpose()?;

        Ok(Self {
            field_id: get("PRICI_FIELD_ID"),
            error_message: get("PRICI_ERROR_MESSAGE"),
            increment_amount,
            record_mode,
        })
    }
}

/// Registration options for [`crate::PriciLayer`].
#[derive(Clone)]
pub struct PriciOptions {
    sdk: SharedQuotaService,
    field_id: Option<String>,
    error_message: Option<String>,
    increment_amount: Option<u64>,
    get_account_id: Option<Arc<dyn ResolveId>>,
    get_field_id: Option<Arc<dyn ResolveId>>,
    get_error: Option<Arc<dyn ResolveError>>,
    get_increment_amount: Option<Arc<dyn ResolveAmount>>,
    record_mode: RecordMode,
}

impl PriciOptions {
    /// Create options around the quota service client.
    #[must_use]
    pub fn new(sdk: SharedQuotaService) -> Self {
        Self {
            sdk,
            field_id: None,
            error_message: None,
            increment_amount: None,
            get_account_id: None,
            get_field_id: None,
            get_error: None,
            get_increment_amount: None,
            record_mode: RecordMode::default(),
        }
    }

    /// Set the static field identifier.
    #[must_use]
    pub fn field_id(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    /// Set the static deny message.
    #[must_use]
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Set the static increment amount.
    #[must_use]
    pub fn increment_amount(mut self, amount: u64) -> Self {
        self.increment_amount = Some(amount);
        self
    }

    /// Override account resolution.
    #[must_use]
    pub fn get_account_id(mut self, resolver: impl ResolveId + 'static) -> Self {
        self.get_account_id = Some(Arc::new(resolver));
        self
    }

    /// Override field resolution.
    #[must_use]
    pub fn get_field_id(mut self, resolver: impl ResolveId + 'static) -> Self {
        self.get_field_id = Some(Arc::new(resolver));
        self
    }

    /// Override deny message resolution.
    #[must_use]
    pub fn get_error(mut self, resolver: impl ResolveError + 'static) -> Self {
        self.get_error = Some(Arc::new(resolver));
        self
    }

    /// Override increment amount resolution.
    #[must_use]
    pub fn get_increment_amount(mut self, resolver: impl ResolveAmount + 'static) -> Self {
        self.get_increment_amount = Some(Arc::new(resolver));
        self
    }

    /// Set when usage is recorded.
    #[must_use]
    pub fn record_mode(mut self, mode: RecordMode) -> Self {
        self.record_mode = mode;
        self
    }

    /// Apply static options, keeping any value already set on `self`.
    #[must_use]
    pub fn with_static(mut self, statics: StaticOptions) -> Self {
        self.field_id = self.field_id.or(statics.field_id);
        self.error_message = self.error_message.or(statics.error_message);
        self.increment_amount = self.increment_amount.or(statics.increment_amount);
        if let Some(mode) = statics.record_mode {
            self.record_mode = mode;
        }
        self
    }

    /// Build the immutable layer configuration.
    #[must_use]
    pub fn build(self) -> PriciConfig {
        let defaults = PriciConfig::defaults(
            self.sdk,
            self.field_id,
            self.error_message,
            self.increment_amount,
            self.record_mode,
        );

        PriciConfig {
            account_id: self.get_account_id.unwrap_or(defaults.account_id),
            field_id: self.get_field_id.unwrap_or(defaults.field_id),
            error: self.get_error.unwrap_or(defaults.error),
            increment_amount: self
                .get_increment_amount
                .unwrap_or(defaults.increment_amount),
            ..defaults
        }
    }
}

impl fmt::Debug for PriciOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriciOptions")
            .field("field_id", &self.field_id)
            .field("error_message", &self.error_message)
            .field("increment_amount", &self.increment_amount)
            .field("get_account_id", &self.get_account_id.is_some())
            .field("get_field_id", &self.get_field_id.is_some())
            .field("get_error", &self.get_error.is_some())
            .field("get_increment_amount", &self.get_increment_amount.is_some())
            .field("record_mode", &self.record_mode)
            .finish_non_exhaustive()
    }
}

/// Immutable configuration shared by every request through the layer.
pub struct PriciConfig {
    pub(crate) sdk: SharedQuotaService,
    pub(crate) account_id: Arc<dyn ResolveId>,
    pub(crate) field_id: Arc<dyn ResolveId>,
    pub(crate) error: Arc<dyn ResolveError>,
    pub(crate) increment_amount: Arc<dyn ResolveAmount>,
    pub(crate) record_mode: RecordMode,
}

impl PriciConfig {
    /// Defaults layered beneath any overrides.
    fn defaults(
        sdk: SharedQuotaService,
        field_id: Option<String>,
        error_message: Option<String>,
        increment_amount: Option<u64>,
        record_mode: RecordMode,
    ) -> Self {
        let message = error_message.unwrap_or_else(|| sdk.default_error_message().to_string());

        Self {
            account_id: Arc::new(DefaultAccountId),
            field_id: Arc::new(DefaultFieldId::new(field_id)),
            error: Arc::new(StaticErrorMessage(message)),
            increment_amount: Arc::new(StaticAmount(increment_amount)),
            record_mode,
            sdk,
        }
    }

    /// The quota service client.
    #[must_use]
    pub fn sdk(&self) -> &SharedQuotaService {
        &self.sdk
    }

    /// When usage is recorded.
    #[must_use]
    pub fn record_mode(&self) -> RecordMode {
        self.record_mode
    }
}

impl fmt::Debug for PriciConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriciConfig")
            .field("record_mode", &self.record_mode)
            .finish_non_exhaustive()
    }
}

impl From<PriciOptions> for PriciConfig {
    fn from(options: PriciOptions) -> Self {
        options.build()
    }
}
