//! Store queries
//!
//! Each query carries its rendered SQL and bindings for a SQL adapter, and
//! the structured parts for adapters that evaluate in memory.

use crate::config::Schema;
use crate::domain::predicate::{SqlFragment, SqlValue, SubscriptionPredicate};

const SUBSCRIPTION_ALIAS: &str = "sub";
const CUSTOMER_ALIAS: &str = "cust";

/// Identities of every customer with a matching subscription.
///
/// Rows are not deduplicated in SQL: several customers may share one
/// account id or email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipQuery {
    predicate: SubscriptionPredicate,
    fragment: SqlFragment,
}

impl MembershipQuery {
    pub fn new(schema: &Schema, predicate: SubscriptionPredicate) -> Self {
        let (condition, params) = predicate.render(SUBSCRIPTION_ALIAS, &schema.subscription).into_parts();
        let sql = format!(
            "SELECT {c}.{account}, {c}.{email} FROM {subs} AS {s} INNER JOIN {customers} AS {c} ON {c}.{id} = {s}.{fk} WHERE {condition}",
            c = CUSTOMER_ALIAS,
            s = SUBSCRIPTION_ALIAS,
            account = schema.customer.account_id,
            email = schema.customer.email,
            id = schema.customer.id,
            fk = schema.subscription.customer_id,
            subs = schema.subscriptions_table,
            customers = schema.customers_table,
        );
        Self { predicate, fragment: SqlFragment::new(sql, params) }
    }

    pub fn predicate(&self) -> &SubscriptionPredicate { &self.predicate }
    pub fn fragment(&self) -> &SqlFragment { &self.fragment }
    pub fn sql(&self) -> &str { self.fragment.sql() }
    pub fn params(&self) -> &[SqlValue] { self.fragment.params() }
}

/// Customers linked to one contact by account id or email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerLookup {
    account_id: Option<u64>,
    email: Option<String>,
    fragment: SqlFragment,
}

impl CustomerLookup {
    /// `None` when neither key is given
    pub fn new(schema: &Schema, account_id: Option<u64>, email: Option<&str>) -> Option<Self> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let Some(id) = account_id {
            clauses.push(format!("{} = ?", schema.customer.account_id));
            params.push(SqlValue::from(id));
        }
        if let Some(email) = email {
            clauses.push(format!("{} = ?", schema.customer.email));
            params.push(SqlValue::from(email));
        }
        if clauses.is_empty() {
            return None;
        }

        let sql = format!(
            "SELECT {id}, {account}, {email} FROM {table} WHERE {clauses} ORDER BY {id}",
            id = schema.customer.id,
            account = schema.customer.account_id,
            email = schema.customer.email,
            table = schema.customers_table,
            clauses = clauses.join(" OR "),
        );
        Some(Self {
            account_id,
            email: email.map(str::to_string),
            fragment: SqlFragment::new(sql, params),
        })
    }

    pub fn account_id(&self) -> Option<u64> { self.account_id }
    pub fn email(&self) -> Option<&str> { self.email.as_deref() }
    pub fn sql(&self) -> &str { self.fragment.sql() }
    pub fn params(&self) -> &[SqlValue] { self.fragment.params() }
}

/// Existence of a matching subscription for one customer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerSubscriptionQuery {
    customer_id: u64,
    predicate: SubscriptionPredicate,
    fragment: SqlFragment,
}

impl CustomerSubscriptionQuery {
    pub fn new(schema: &Schema, customer_id: u64, predicate: SubscriptionPredicate) -> Self {
        let (condition, condition_params) =
            predicate.render(SUBSCRIPTION_ALIAS, &schema.subscription).into_parts();
        let sql = format!(
            "SELECT {s}.{id} FROM {subs} AS {s} WHERE {s}.{fk} = ? AND {condition} LIMIT 1",
            s = SUBSCRIPTION_ALIAS,
            id = schema.subscription.id,
            fk = schema.subscription.customer_id,
            subs = schema.subscriptions_table,
        );
        let mut params = Vec::with_capacity(condition_params.len() + 1);
        params.push(SqlValue::from(customer_id));
        params.extend(condition_params);

        Self { customer_id, predicate, fragment: SqlFragment::new(sql, params) }
    }

    pub fn customer_id(&self) -> u64 { self.customer_id }
    pub fn predicate(&self) -> &SubscriptionPredicate { &self.predicate }
    pub fn sql(&self) -> &str { self.fragment.sql() }
    pub fn params(&self) -> &[SqlValue] { self.fragment.params() }
}
