//! Rules configuration
//!
//! Table and column names, the site UTC offset and the commerce provider.
//! Names are validated and resolved once into a [`Schema`]; queries only
//! ever read the resolved schema.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{RuleError, RuleResult};

/// Subscription table columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionColumns {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub price_id: String,
    pub status: String,
    pub expiration: String,
}

impl Default for SubscriptionColumns {
    fn default() -> Self {
        Self {
            id: "id".into(),
            customer_id: "customer_id".into(),
            product_id: "product_id".into(),
            price_id: "price_id".into(),
            status: "status".into(),
            expiration: "expiration".into(),
        }
    }
}

/// Commerce customer table columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerColumns {
    pub id: String,
    pub account_id: String,
    pub email: String,
}

impl Default for CustomerColumns {
    fn default() -> Self {
        Self {
            id: "id".into(),
            account_id: "user_id".into(),
            email: "email".into(),
        }
    }
}

/// CRM contact table columns used by segment filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactColumns {
    pub id: String,
    pub account_id: String,
    pub email: String,
}

impl Default for ContactColumns {
    fn default() -> Self {
        Self {
            id: "id".into(),
            account_id: "user_id".into(),
            email: "email".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub table_prefix: String,
    pub subscriptions_table: String,
    pub customers_table: String,
    pub subscription_columns: SubscriptionColumns,
    pub customer_columns: CustomerColumns,
    pub contact_columns: ContactColumns,
    /// Site offset from UTC in hours; fractional zones such as 5.5 allowed
    pub utc_offset_hours: f64,
    pub commerce_provider: String,
    pub selector_search_limit: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            table_prefix: "wp_".into(),
            subscriptions_table: "edd_subscriptions".into(),
            customers_table: "edd_customers".into(),
            subscription_columns: SubscriptionColumns::default(),
            customer_columns: CustomerColumns::default(),
            contact_columns: ContactColumns::default(),
            utc_offset_hours: 0.0,
            commerce_provider: "edd".into(),
            selector_search_limit: 50,
        }
    }
}

impl RulesConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> RuleResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| RuleError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> RuleResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| RuleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> RuleResult<String> {
        toml::to_string_pretty(self).map_err(|e| RuleError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> RuleResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RuleError::Config(e.to_string()))?;
        }
        fs::write(path, self.to_toml_string()?).map_err(|e| RuleError::Config(e.to_string()))
    }

    /// Reject identifiers that are unsafe to splice into SQL and out-of-range offsets
    pub fn validate(&self) -> RuleResult<()> {
        let identifiers = [
            ("table_prefix", &self.table_prefix, true),
            ("subscriptions_table", &self.subscriptions_table, false),
            ("customers_table", &self.customers_table, false),
            ("subscription_columns.id", &self.subscription_columns.id, false),
            ("subscription_columns.customer_id", &self.subscription_columns.customer_id, false),
            ("subscription_columns.product_id", &self.subscription_columns.product_id, false),
            ("subscription_columns.price_id", &self.subscription_columns.price_id, false),
            ("subscription_columns.status", &self.subscription_columns.status, false),
            ("subscription_columns.expiration", &self.subscription_columns.expiration, false),
            ("customer_columns.id", &self.customer_columns.id, false),
            ("customer_columns.account_id", &self.customer_columns.account_id, false),
            ("customer_columns.email", &self.customer_columns.email, false),
            ("contact_columns.id", &self.contact_columns.id, false),
            ("contact_columns.account_id", &self.contact_columns.account_id, false),
            ("contact_columns.email", &self.contact_columns.email, false),
        ];
        for (name, value, may_be_empty) in identifiers {
            if !is_identifier(value, may_be_empty) {
                return Err(RuleError::Config(format!("{} is not a valid SQL identifier: {:?}", name, value)));
            }
        }

        self.utc_offset()?;

        if self.commerce_provider.is_empty() {
            return Err(RuleError::Config("commerce_provider must be set".into()));
        }
        if self.selector_search_limit == 0 {
            return Err(RuleError::Config("selector_search_limit must be positive".into()));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> RuleResult<FixedOffset> {
        let hours = self.utc_offset_hours;
        if !hours.is_finite() || !(-14.0..=14.0).contains(&hours) {
            return Err(RuleError::Config(format!("utc_offset_hours out of range: {}", hours)));
        }
        let seconds = (hours * 3600.0).round() as i32;
        FixedOffset::east_opt(seconds)
            .ok_or_else(|| RuleError::Config(format!("utc_offset_hours out of range: {}", hours)))
    }

    /// Resolve prefixed table names and columns
    pub fn schema(&self) -> Schema {
        Schema {
            subscriptions_table: format!("{}{}", self.table_prefix, self.subscriptions_table),
            customers_table: format!("{}{}", self.table_prefix, self.customers_table),
            subscription: self.subscription_columns.clone(),
            customer: self.customer_columns.clone(),
            contact: self.contact_columns.clone(),
        }
    }
}

fn is_identifier(value: &str, may_be_empty: bool) -> bool {
    if value.is_empty() {
        return may_be_empty;
    }
    value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolved table and column names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub subscriptions_table: String,
    pub customers_table: String,
    pub subscription: SubscriptionColumns,
    pub customer: CustomerColumns,
    pub contact: ContactColumns,
}

impl Default for Schema {
    fn default() -> Self {
        RulesConfig::default().schema()
    }
}
