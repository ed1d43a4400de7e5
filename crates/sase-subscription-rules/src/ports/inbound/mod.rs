//! Inbound ports (Use case traits)
//!
//! What a CRM filtering pipeline calls: the bulk segment filter, the
//! per-contact automation condition and the product selector options feed.

use serde::{Deserialize, Serialize};

use crate::application::Assessment;
use crate::domain::{ContactRef, RawFilter};
use crate::error::RuleResult;
use crate::ports::outbound::ContactQueryBuilder;

/// Narrows a contact query by a list of filters
pub trait SegmentFilter: Send + Sync {
    /// Constrain `query` by every usable filter. Skipped filters leave it untouched.
    fn apply(&self, query: &mut dyn ContactQueryBuilder, filters: &[RawFilter]) -> RuleResult<()>;
}

/// Decides whether one contact passes an automation step's conditions
pub trait AutomationCondition: Send + Sync {
    /// Conjunction of `conditions`; `previous` passes through when none disqualifies
    fn assess(&self, contact: &ContactRef, conditions: &[RawFilter], previous: bool) -> RuleResult<bool> {
        Ok(self.assess_detailed(contact, conditions, previous)?.passed)
    }

    fn assess_detailed(
        &self,
        contact: &ContactRef,
        conditions: &[RawFilter],
        previous: bool,
    ) -> RuleResult<Assessment>;
}

/// Option for the product selector
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOption {
    pub id: String,
    pub title: String,
}

/// Options feed for the product selector component
pub trait SelectorOptions: Send + Sync {
    fn product_selector_options(&self, search: &str, included_ids: &[u64]) -> RuleResult<Vec<SelectorOption>>;
}
