//! Filter conditions
//!
//! A `RawFilter` is what the segment editor or automation step stores; a
//! `FilterCondition` is the validated form the compiler works with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::catalog::{ConditionCatalog, ConditionKind};
use crate::domain::value_objects::{Operator, ProductSelector, SubscriptionStatus};
use crate::error::{RuleError, RuleResult};

/// Condition as stored by a segment filter or automation step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFilter {
    /// Condition key; automations store it as `data_key`
    #[serde(default, alias = "data_key")]
    pub property: String,
    /// `in` when absent
    #[serde(default)]
    pub operator: Option<String>,
    /// One selector token or a list of them; automations store it as `data_value`
    #[serde(default, alias = "data_value")]
    pub value: Value,
}

impl RawFilter {
    pub fn new<I, S>(property: impl Into<String>, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            property: property.into(),
            operator: Some(operator.as_str().to_string()),
            value: Value::Array(values.into_iter().map(|v| Value::String(v.into())).collect()),
        }
    }

    /// Selector tokens carried by `value`
    pub fn tokens(&self) -> Vec<String> {
        fn token(value: &Value) -> Option<String> {
            match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        }

        match &self.value {
            Value::Array(values) => values.iter().filter_map(token).collect(),
            other => token(other).into_iter().collect(),
        }
    }
}

/// Validated, enabled condition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCondition {
    pub kind: ConditionKind,
    pub operator: Operator,
    /// Never empty
    pub selectors: Vec<ProductSelector>,
    /// Empty means any status
    pub statuses: Vec<SubscriptionStatus>,
}

impl FilterCondition {
    /// Validate a raw filter against the catalog.
    ///
    /// Gating is checked before the value is looked at, so a disabled
    /// condition never reaches the store.
    pub fn from_raw(raw: &RawFilter, catalog: &ConditionCatalog) -> RuleResult<Self> {
        let entry = catalog
            .get(&raw.property)
            .ok_or_else(|| RuleError::UnknownCondition(raw.property.clone()))?;

        if !entry.is_enabled() {
            return Err(RuleError::ConditionDisabled(entry.key().to_string()));
        }

        let operator = match raw.operator.as_deref() {
            None | Some("") => Operator::default(),
            Some(op) => op.parse::<Operator>().map_err(|_| RuleError::UnsupportedOperator {
                property: entry.key().to_string(),
                operator: op.to_string(),
            })?,
        };
        if !entry.allows(operator) {
            return Err(RuleError::UnsupportedOperator {
                property: entry.key().to_string(),
                operator: operator.to_string(),
            });
        }

        let kind = entry.kind();
        Ok(Self {
            kind,
            operator,
            selectors: parse_selectors(&raw.tokens())?,
            statuses: kind.statuses(),
        })
    }
}

/// Parse selector tokens, dropping malformed ones.
///
/// Fails with `EmptySelectorSet` only when nothing usable remains.
pub fn parse_selectors(tokens: &[String]) -> RuleResult<Vec<ProductSelector>> {
    let mut selectors: Vec<ProductSelector> = Vec::with_capacity(tokens.len());

    for token in tokens {
        match ProductSelector::parse(token) {
            Ok(selector) if !selectors.contains(&selector) => selectors.push(selector),
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "dropping product selector"),
        }
    }

    if selectors.is_empty() {
        return Err(RuleError::EmptySelectorSet);
    }
    Ok(selectors)
}
