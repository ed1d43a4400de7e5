//! Condition Catalog
//!
//! Declares every subscription condition a segment or automation can use.
//! Entries stay listed when their feature gates are off so the UI can show
//! them greyed out, but a disabled entry is never evaluated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::{Operator, SubscriptionStatus};
use crate::error::RuleError;
use crate::ports::outbound::FeatureGates;

/// Filter group key the catalog is published under
pub const GROUP_KEY: &str = "edd_subscriptions";
pub const GROUP_LABEL: &str = "EDD Subscriptions";
/// Options endpoint feeding the product selector
pub const OPTION_KEY: &str = "product_selector_edd_subscriptions";
/// Fixed "expiring soon" windows, in days
pub const EXPIRING_WINDOWS: [u32; 4] = [7, 14, 30, 60];

const HAS_SUBSCRIPTION_PREFIX: &str = "has_subscription_";
const EXPIRING_PREFIX: &str = "subscription_expiring_";
const ANY_STATUS: &str = "any";

/// Kind of subscription condition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// Has a subscription in `status`, or in any status when `None`
    HasSubscription { status: Option<SubscriptionStatus> },
    /// Has an active subscription expiring within `days`
    ExpiringWithin { days: u32 },
}

impl ConditionKind {
    /// Property key, e.g. `has_subscription_active` or `subscription_expiring_30d`
    pub fn key(&self) -> String {
        match self {
            Self::HasSubscription { status: None } => format!("{}{}", HAS_SUBSCRIPTION_PREFIX, ANY_STATUS),
            Self::HasSubscription { status: Some(status) } => {
                format!("{}{}", HAS_SUBSCRIPTION_PREFIX, status.as_str())
            }
            Self::ExpiringWithin { days } => format!("{}{}d", EXPIRING_PREFIX, days),
        }
    }

    /// Status restriction; empty means any status
    pub fn statuses(&self) -> Vec<SubscriptionStatus> {
        match self {
            Self::HasSubscription { status } => status.iter().copied().collect(),
            Self::ExpiringWithin { .. } => vec![],
        }
    }

    pub fn window_days(&self) -> Option<u32> {
        match self {
            Self::HasSubscription { .. } => None,
            Self::ExpiringWithin { days } => Some(*days),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::HasSubscription { status } => format!("Has {} Subscription", status_label(*status)),
            Self::ExpiringWithin { days } => format!("Subscription Expiring in {} Days", days),
        }
    }

    fn help(&self) -> String {
        match self {
            Self::HasSubscription { status } => format!(
                "Filter contacts who have a {} subscription for selected products",
                status_label(*status).to_lowercase()
            ),
            Self::ExpiringWithin { days } => format!(
                "Filter contacts whose active subscription will expire within {} days",
                days
            ),
        }
    }

    fn operator_label(&self, operator: Operator) -> String {
        match (self, operator) {
            (Self::HasSubscription { status }, Operator::In) => format!("Has {}", status_label(*status)),
            (Self::HasSubscription { status }, Operator::NotIn) => {
                format!("Does Not Have {}", status_label(*status))
            }
            (Self::ExpiringWithin { days }, Operator::In) => format!("Expiring in {} Days", days),
            (Self::ExpiringWithin { days }, Operator::NotIn) => format!("Not Expiring in {} Days", days),
        }
    }
}

fn status_label(status: Option<SubscriptionStatus>) -> &'static str {
    status.map_or("Any Status", |s| s.label())
}

impl FromStr for ConditionKind {
    type Err = RuleError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let unknown = || RuleError::UnknownCondition(key.to_string());

        if let Some(status) = key.strip_prefix(HAS_SUBSCRIPTION_PREFIX) {
            if status == ANY_STATUS {
                return Ok(Self::HasSubscription { status: None });
            }
            let status = status.parse::<SubscriptionStatus>().map_err(|_| unknown())?;
            return Ok(Self::HasSubscription { status: Some(status) });
        }

        if let Some(window) = key.strip_prefix(EXPIRING_PREFIX) {
            let days = window
                .strip_suffix('d')
                .and_then(|days| days.parse::<u32>().ok())
                .filter(|days| *days > 0)
                .ok_or_else(unknown)?;
            return Ok(Self::ExpiringWithin { days });
        }

        Err(unknown())
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Catalog entry, immutable once the catalog is built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    kind: ConditionKind,
    key: String,
    allowed_operators: Vec<Operator>,
    enabled: bool,
}

impl CatalogEntry {
    fn new(kind: ConditionKind, enabled: bool) -> Self {
        Self {
            key: kind.key(),
            kind,
            allowed_operators: Operator::ALL.to_vec(),
            enabled,
        }
    }

    pub fn kind(&self) -> ConditionKind { self.kind }
    pub fn key(&self) -> &str { &self.key }
    pub fn allowed_operators(&self) -> &[Operator] { &self.allowed_operators }
    pub fn is_enabled(&self) -> bool { self.enabled }
    pub fn window_days(&self) -> Option<u32> { self.kind.window_days() }

    pub fn allows(&self, operator: Operator) -> bool {
        self.allowed_operators.contains(&operator)
    }

    /// Presentation descriptor for the filter UI
    pub fn item(&self) -> ConditionItem {
        ConditionItem {
            value: self.key.clone(),
            label: self.kind.label(),
            item_type: "selections".into(),
            component: "product_selector".into(),
            option_key: OPTION_KEY.into(),
            is_multiple: true,
            disabled: !self.enabled,
            help: self.kind.help(),
            custom_operators: self
                .allowed_operators
                .iter()
                .map(|op| (*op, self.kind.operator_label(*op)))
                .collect(),
        }
    }
}

/// Filter UI descriptor for one condition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionItem {
    pub value: String,
    pub label: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub component: String,
    pub option_key: String,
    pub is_multiple: bool,
    pub disabled: bool,
    pub help: String,
    pub custom_operators: BTreeMap<Operator, String>,
}

/// Group of conditions shown together in the filter UI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub label: String,
    pub value: String,
    pub children: Vec<ConditionItem>,
}

/// Subscription condition catalog
#[derive(Clone, Debug)]
pub struct ConditionCatalog {
    entries: Vec<CatalogEntry>,
}

impl ConditionCatalog {
    /// Build the catalog, gating every entry on commerce and recurring billing
    pub fn new(gates: &dyn FeatureGates, provider: &str) -> Self {
        let enabled = gates.commerce_enabled(provider) && gates.recurring_billing_available();
        Self::with_enabled(enabled)
    }

    /// Build the catalog with a precomputed gate
    pub fn with_enabled(enabled: bool) -> Self {
        let statuses = std::iter::once(None).chain(SubscriptionStatus::ALL.into_iter().map(Some));
        let entries = statuses
            .map(|status| ConditionKind::HasSubscription { status })
            .chain(EXPIRING_WINDOWS.into_iter().map(|days| ConditionKind::ExpiringWithin { days }))
            .map(|kind| CatalogEntry::new(kind, enabled))
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Look up an entry by property key
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn entry(&self, kind: ConditionKind) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.kind == kind)
    }

    pub fn filter_group(&self) -> FilterGroup {
        FilterGroup {
            label: GROUP_LABEL.into(),
            value: GROUP_KEY.into(),
            children: self.entries.iter().map(CatalogEntry::item).collect(),
        }
    }
}
