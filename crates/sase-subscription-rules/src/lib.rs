//! OpenSASE Subscription Rules
//!
//! Segment filters and automation conditions keyed on a contact's
//! subscriptions in the commerce store.
//!
//! ## Architecture
//!
//! ```text
//!  RawFilter ──► ConditionCompiler ──► SubscriptionPredicate
//!                     │                        │
//!              ConditionCatalog        ┌───────┴────────┐
//!              (feature gated)         ▼                ▼
//!                              MembershipResolver   SingleEntityAssessor
//!                                      │                │
//!                              MatchedIdentitySet     bool
//!                                      │
//!                              BulkFilterApplier ──► ContactQueryBuilder
//! ```
//!
//! - **Domain Layer**: selectors, statuses, catalog, predicate, identity sets
//! - **Ports Layer**: store, query builder, feature gates, product catalog
//! - **Application Layer**: resolver, bulk applier, assessor, registry
//! - **Infrastructure Layer**: in-memory adapters
//!
//! The bulk path resolves matching identities from the subscription table
//! first and then constrains the contact query by that set, never with a
//! per-contact existence check.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::{
    Assessment, BulkFilterApplier, ConditionCompiler, FilterRegistry, MembershipCheck,
    MembershipResolver, ProductSelectorOptions, SingleEntityAssessor, SkippedCondition,
    SubscriptionRules,
};
pub use config::{RulesConfig, Schema};
pub use domain::{
    CatalogEntry, ConditionCatalog, ConditionItem, ConditionKind, ContactRef, ExpirationWindow,
    FilterCondition, FilterGroup, MatchedIdentitySet, Operator, ProductSelector, RawFilter,
    SqlFragment, SqlValue, SubscriptionPredicate, SubscriptionStatus,
};
pub use error::{RuleError, RuleResult};
pub use ports::inbound::{AutomationCondition, SegmentFilter, SelectorOption, SelectorOptions};
pub use ports::outbound::{
    Clock, ContactQueryBuilder, FeatureGates, ProductCatalog, StoreError, SubscriptionStore,
};
