//! Subscription rules service
//!
//! Wires the compiler, resolver, applier and assessor behind the
//! `SegmentFilter` and `AutomationCondition` use cases. Both surfaces skip
//! the same conditions the same way.

use std::sync::Arc;

use crate::application::{
    BulkFilterApplier, ConditionCompiler, FilterRegistry, MembershipResolver, SingleEntityAssessor,
};
use crate::config::RulesConfig;
use crate::domain::catalog::GROUP_KEY;
use crate::domain::{ConditionCatalog, ContactRef, FilterCondition, RawFilter, SubscriptionPredicate};
use crate::error::{RuleError, RuleResult};
use crate::ports::inbound::{AutomationCondition, SegmentFilter};
use crate::ports::outbound::{Clock, ContactQueryBuilder, FeatureGates, SubscriptionStore};

/// Condition left out of an evaluation
#[derive(Debug)]
pub struct SkippedCondition {
    pub property: String,
    pub reason: RuleError,
}

/// Outcome of an automation assessment
#[derive(Debug)]
pub struct Assessment {
    pub passed: bool,
    /// Non-fatal findings such as ambiguous customer matches
    pub diagnostics: Vec<RuleError>,
    pub skipped: Vec<SkippedCondition>,
}

/// Collects skipped conditions for one evaluation
#[derive(Default)]
struct Skips {
    disabled_logged: bool,
    skipped: Vec<SkippedCondition>,
}

impl Skips {
    fn record(&mut self, raw: &RawFilter, reason: RuleError) {
        match &reason {
            RuleError::ConditionDisabled(property) => {
                if !self.disabled_logged {
                    tracing::info!(%property, "subscription conditions disabled, skipping");
                    self.disabled_logged = true;
                }
            }
            RuleError::UnsupportedOperator { property, operator } => {
                tracing::warn!(%property, %operator, "unsupported operator, skipping condition");
            }
            RuleError::UnknownCondition(property) => {
                tracing::warn!(%property, "unknown subscription condition, skipping");
            }
            other => tracing::debug!(property = %raw.property, reason = %other, "skipping condition"),
        }
        self.skipped.push(SkippedCondition { property: raw.property.clone(), reason });
    }
}

pub struct SubscriptionRules {
    compiler: ConditionCompiler,
    resolver: MembershipResolver,
    applier: BulkFilterApplier,
    assessor: SingleEntityAssessor,
}

impl SubscriptionRules {
    /// Build from a validated config. Feature gates are read once here.
    pub fn new(
        config: &RulesConfig,
        store: Arc<dyn SubscriptionStore>,
        gates: &dyn FeatureGates,
        clock: Arc<dyn Clock>,
    ) -> RuleResult<Self> {
        config.validate()?;
        let schema = config.schema();
        let catalog = ConditionCatalog::new(gates, &config.commerce_provider);

        Ok(Self {
            compiler: ConditionCompiler::new(catalog, clock, config.utc_offset()?),
            applier: BulkFilterApplier::new(schema.contact.clone()),
            resolver: MembershipResolver::new(store.clone(), schema.clone()),
            assessor: SingleEntityAssessor::new(store, schema),
        })
    }

    pub fn catalog(&self) -> &ConditionCatalog {
        self.compiler.catalog()
    }

    pub fn compiler(&self) -> &ConditionCompiler {
        &self.compiler
    }

    /// Publish the catalog and both evaluation surfaces under the group key
    pub fn register(self: &Arc<Self>, registry: &mut FilterRegistry) {
        registry.register_group(self.catalog().filter_group());
        registry.register_segment_filter(GROUP_KEY, self.clone());
        registry.register_automation_condition(GROUP_KEY, self.clone());
    }

    /// Compile one filter, routing skippable failures into `skips`
    fn compile(
        &self,
        raw: &RawFilter,
        skips: &mut Skips,
    ) -> RuleResult<Option<(FilterCondition, SubscriptionPredicate)>> {
        match self.compiler.compile(raw) {
            Ok(compiled) => Ok(Some(compiled)),
            Err(error) if error.is_skippable() => {
                skips.record(raw, error);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

impl SegmentFilter for SubscriptionRules {
    fn apply(&self, query: &mut dyn ContactQueryBuilder, filters: &[RawFilter]) -> RuleResult<()> {
        let mut skips = Skips::default();

        for raw in filters {
            let Some((condition, predicate)) = self.compile(raw, &mut skips)? else {
                continue;
            };
            let identities = self.resolver.resolve(predicate)?;
            self.applier.apply(query, condition.operator, &identities);
        }
        Ok(())
    }
}

impl AutomationCondition for SubscriptionRules {
    fn assess_detailed(
        &self,
        contact: &ContactRef,
        conditions: &[RawFilter],
        previous: bool,
    ) -> RuleResult<Assessment> {
        let mut skips = Skips::default();
        let mut diagnostics = Vec::new();
        let mut passed = previous;

        for raw in conditions {
            let Some((condition, predicate)) = self.compile(raw, &mut skips)? else {
                continue;
            };
            let check = self.assessor.check(contact, &predicate)?;
            diagnostics.extend(check.ambiguity);

            if !condition.operator.is_satisfied_by(check.member) {
                passed = false;
                break;
            }
        }

        Ok(Assessment { passed, diagnostics, skipped: skips.skipped })
    }
}
