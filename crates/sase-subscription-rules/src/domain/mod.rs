//! Domain module
//!
//! Condition catalog, compiled predicates and identity sets.

pub mod catalog;
pub mod condition;
pub mod identity;
pub mod predicate;
pub mod query;
pub mod records;
pub mod value_objects;

pub use catalog::{CatalogEntry, ConditionCatalog, ConditionItem, ConditionKind, FilterGroup};
pub use condition::{FilterCondition, RawFilter};
pub use identity::{ContactRef, MatchedIdentitySet};
pub use predicate::{ExpirationWindow, SqlFragment, SqlValue, SubscriptionPredicate};
pub use query::{CustomerLookup, CustomerSubscriptionQuery, MembershipQuery};
pub use records::{CustomerRecord, SubscriptionRecord};
pub use value_objects::*;
