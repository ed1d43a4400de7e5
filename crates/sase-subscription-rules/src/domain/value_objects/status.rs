//! Subscription status as stored by the commerce platform

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed subscription statuses offered as conditions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
    Pending,
    Failing,
    Completed,
}

impl SubscriptionStatus {
    /// Catalog order
    pub const ALL: [SubscriptionStatus; 6] = [
        Self::Active,
        Self::Expired,
        Self::Cancelled,
        Self::Pending,
        Self::Failing,
        Self::Completed,
    ];

    /// Value persisted in the status column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Pending => "pending",
            Self::Failing => "failing",
            Self::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
            Self::Pending => "Pending",
            Self::Failing => "Failing",
            Self::Completed => "Completed",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown subscription status: {}", s))
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
