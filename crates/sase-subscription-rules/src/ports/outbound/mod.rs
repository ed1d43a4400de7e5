//! Outbound ports
//!
//! Collaborators the rules consume: the commerce subscription store, the
//! contact query builder, feature gates, the product catalog and a clock.
//! All calls are blocking; one store round-trip per evaluated condition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::query::{CustomerLookup, CustomerSubscriptionQuery, MembershipQuery};
use crate::domain::SqlValue;

/// Identity projected from a subscription's owning customer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityRow {
    pub account_id: Option<i64>,
    pub email: Option<String>,
}

/// Customer row from the commerce store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerRow {
    pub id: u64,
    pub account_id: Option<i64>,
    pub email: Option<String>,
}

/// Read-only access to commerce subscriptions
pub trait SubscriptionStore: Send + Sync {
    /// Run the two-phase membership query, one row per matching subscription
    fn fetch_identities(&self, query: &MembershipQuery) -> Result<Vec<IdentityRow>, StoreError>;

    /// Customers matching the lookup's account id or email, ordered by id
    fn find_customers(&self, lookup: &CustomerLookup) -> Result<Vec<CustomerRow>, StoreError>;

    /// Whether any subscription of one customer satisfies the predicate
    fn has_matching_subscription(&self, query: &CustomerSubscriptionQuery) -> Result<bool, StoreError>;
}

/// Contact query builder owned by the caller for one request
pub trait ContactQueryBuilder {
    fn where_in(&mut self, column: &str, values: Vec<SqlValue>);

    fn or_where_in(&mut self, column: &str, values: Vec<SqlValue>);

    fn where_not_in(&mut self, column: &str, values: Vec<SqlValue>);

    fn where_eq(&mut self, column: &str, value: SqlValue);

    /// Add a parenthesized group built by `group`
    fn where_group(&mut self, group: &dyn Fn(&mut dyn ContactQueryBuilder));
}

/// Platform capability checks
pub trait FeatureGates: Send + Sync {
    /// Commerce integration enabled for the provider
    fn commerce_enabled(&self, provider: &str) -> bool;

    /// Recurring billing extension installed
    fn recurring_billing_available(&self) -> bool;
}

/// Product with its price options
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    /// Empty for single-price products
    #[serde(default)]
    pub variable_prices: Vec<PriceOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOption {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Product search for the selector UI
pub trait ProductCatalog: Send + Sync {
    /// Published product ids matching `term`; title order when `term` is empty
    fn search(&self, term: &str, limit: usize) -> Result<Vec<u64>, CatalogError>;

    fn product(&self, id: u64) -> Result<Option<Product>, CatalogError>;
}

/// Wall clock
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Subscription store error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Product catalog error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}
