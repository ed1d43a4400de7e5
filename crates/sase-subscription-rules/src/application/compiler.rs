//! Condition compiler

use chrono::FixedOffset;
use std::sync::Arc;

use crate::domain::{ConditionCatalog, ExpirationWindow, FilterCondition, RawFilter, SubscriptionPredicate};
use crate::error::RuleResult;
use crate::ports::outbound::Clock;

/// Turns raw filters into validated conditions and their predicates
pub struct ConditionCompiler {
    catalog: ConditionCatalog,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl ConditionCompiler {
    pub fn new(catalog: ConditionCatalog, clock: Arc<dyn Clock>, utc_offset: FixedOffset) -> Self {
        Self { catalog, clock, utc_offset }
    }

    pub fn catalog(&self) -> &ConditionCatalog {
        &self.catalog
    }

    /// Validate against the catalog
    pub fn prepare(&self, raw: &RawFilter) -> RuleResult<FilterCondition> {
        FilterCondition::from_raw(raw, &self.catalog)
    }

    /// Predicate for a validated condition; expiring kinds read the clock
    pub fn predicate(&self, condition: &FilterCondition) -> RuleResult<SubscriptionPredicate> {
        let window = condition
            .kind
            .window_days()
            .map(|days| ExpirationWindow::ending_in_days(self.clock.now(), days, self.utc_offset))
            .transpose()?;

        SubscriptionPredicate::build(condition.selectors.clone(), condition.statuses.clone(), window)
    }

    pub fn compile(&self, raw: &RawFilter) -> RuleResult<(FilterCondition, SubscriptionPredicate)> {
        let condition = self.prepare(raw)?;
        let predicate = self.predicate(&condition)?;
        tracing::debug!(
            property = %condition.kind,
            operator = %condition.operator,
            selectors = predicate.selectors().len(),
            "condition compiled"
        );
        Ok((condition, predicate))
    }
}
