//! Filter registry
//!
//! Explicit registration point for filter groups. A CRM pipeline routes each
//! group's filters to whatever registered under that group's key.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{ContactRef, FilterGroup, RawFilter};
use crate::error::RuleResult;
use crate::ports::inbound::{AutomationCondition, SegmentFilter};
use crate::ports::outbound::ContactQueryBuilder;

#[derive(Default)]
pub struct FilterRegistry {
    groups: BTreeMap<String, FilterGroup>,
    segment_filters: BTreeMap<String, Arc<dyn SegmentFilter>>,
    automation_conditions: BTreeMap<String, Arc<dyn AutomationCondition>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a group's condition items; replaces an earlier group with the same key
    pub fn register_group(&mut self, group: FilterGroup) {
        self.groups.insert(group.value.clone(), group);
    }

    pub fn register_segment_filter(&mut self, group: &str, filter: Arc<dyn SegmentFilter>) {
        self.segment_filters.insert(group.to_string(), filter);
    }

    pub fn register_automation_condition(&mut self, group: &str, condition: Arc<dyn AutomationCondition>) {
        self.automation_conditions.insert(group.to_string(), condition);
    }

    /// Registered groups in key order
    pub fn groups(&self) -> Vec<&FilterGroup> {
        self.groups.values().collect()
    }

    /// Apply `filters` of `group`; an unknown group leaves the query untouched
    pub fn apply_filters(
        &self,
        group: &str,
        query: &mut dyn ContactQueryBuilder,
        filters: &[RawFilter],
    ) -> RuleResult<()> {
        match self.segment_filters.get(group) {
            Some(filter) => filter.apply(query, filters),
            None => {
                tracing::debug!(%group, "no segment filter registered");
                Ok(())
            }
        }
    }

    /// Assess `conditions` of `group`; an unknown group returns `previous`
    pub fn assess(
        &self,
        group: &str,
        contact: &ContactRef,
        conditions: &[RawFilter],
        previous: bool,
    ) -> RuleResult<bool> {
        match self.automation_conditions.get(group) {
            Some(condition) => condition.assess(contact, conditions, previous),
            None => {
                tracing::debug!(%group, "no automation condition registered");
                Ok(previous)
            }
        }
    }
}
