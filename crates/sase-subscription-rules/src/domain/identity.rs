//! Identities
//!
//! Contacts link to commerce customers by CRM account id or by email. The two
//! keys are alternatives for one logical account: a contact matches a set if
//! either key is in it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ports::outbound::IdentityRow;

/// Contact as seen by the rules
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub id: u64,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactRef {
    pub fn new(id: u64, account_id: Option<i64>, email: Option<&str>) -> Self {
        Self { id, account_id, email: email.map(str::to_string) }
    }

    /// Account id if present and positive
    pub fn linked_account(&self) -> Option<u64> {
        self.account_id.filter(|id| *id > 0).map(|id| id as u64)
    }

    /// Email if present and non-empty
    pub fn linked_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| !email.is_empty())
    }

    /// Whether the contact can be linked to a customer at all
    pub fn has_identity(&self) -> bool {
        self.linked_account().is_some() || self.linked_email().is_some()
    }
}

/// Deduplicated identities found to satisfy a predicate
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedIdentitySet {
    account_ids: BTreeSet<u64>,
    emails: BTreeSet<String>,
}

impl MatchedIdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect identities from result rows, skipping non-positive ids and empty emails
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = IdentityRow>,
    {
        let mut set = Self::new();
        for row in rows {
            if let Some(id) = row.account_id.filter(|id| *id > 0) {
                set.account_ids.insert(id as u64);
            }
            if let Some(email) = row.email.filter(|email| !email.is_empty()) {
                set.emails.insert(email);
            }
        }
        set
    }

    pub fn account_ids(&self) -> &BTreeSet<u64> { &self.account_ids }
    pub fn emails(&self) -> &BTreeSet<String> { &self.emails }

    pub fn is_empty(&self) -> bool {
        self.account_ids.is_empty() && self.emails.is_empty()
    }

    /// Union test across both keys
    pub fn contains(&self, contact: &ContactRef) -> bool {
        contact.linked_account().is_some_and(|id| self.account_ids.contains(&id))
            || contact.linked_email().is_some_and(|email| self.emails.contains(email))
    }
}
