//! Commerce store records
//!
//! Shapes of the rows owned by the commerce platform. The rules only read
//! them; the in-memory store keeps them for tests and local tooling.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Commerce customer, linked to a CRM account by id or email
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: u64,
    pub account_id: Option<i64>,
    pub email: Option<String>,
}

/// Recurring subscription for one product price
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: u64,
    pub customer_id: u64,
    pub product_id: u64,
    pub price_id: Option<u64>,
    /// Raw status column; the platform may use values outside the catalog
    pub status: String,
    /// Site-local expiration timestamp
    pub expiration: Option<NaiveDateTime>,
}
