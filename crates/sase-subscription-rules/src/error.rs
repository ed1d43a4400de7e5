//! Error types for subscription rules

use thiserror::Error;

use crate::ports::outbound::{CatalogError, StoreError};

/// Subscription rule error type
#[derive(Error, Debug)]
pub enum RuleError {
    /// A product selector token is not `product` or `product:variant`
    #[error("malformed selector {token:?}: {reason}")]
    MalformedSelector { token: String, reason: String },

    /// No usable selectors remained for a condition
    #[error("condition has no usable selectors")]
    EmptySelectorSet,

    /// The subscription store failed to answer
    #[error("subscription lookup failed: {0}")]
    ResolutionFailed(#[from] StoreError),

    /// A contact's account id and email point at different customers
    #[error("account id matches customer {by_account} but email matches customer {by_email}")]
    AmbiguousAccountMatch { by_account: u64, by_email: u64 },

    /// Property key is not a subscription condition
    #[error("unknown condition: {0}")]
    UnknownCondition(String),

    /// Condition is listed but its feature gates are off
    #[error("condition disabled: {0}")]
    ConditionDisabled(String),

    /// Operator is not offered by the condition
    #[error("operator {operator:?} not supported by {property}")]
    UnsupportedOperator { property: String, operator: String },

    /// The product catalog failed to answer
    #[error("product catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl RuleError {
    /// Errors that drop a single condition instead of failing the evaluation.
    ///
    /// A skipped condition behaves as if it were absent from the filter list.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::EmptySelectorSet
                | Self::UnknownCondition(_)
                | Self::ConditionDisabled(_)
                | Self::UnsupportedOperator { .. }
        )
    }
}

/// Result type for subscription rules
pub type RuleResult<T> = Result<T, RuleError>;
