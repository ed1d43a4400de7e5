//! Application layer
//!
//! Compiles conditions and runs them through the bulk and single-contact paths.

pub mod assessor;
pub mod bulk;
pub mod compiler;
pub mod registry;
pub mod resolver;
pub mod selector_options;
pub mod service;

pub use assessor::{MembershipCheck, SingleEntityAssessor};
pub use bulk::BulkFilterApplier;
pub use compiler::ConditionCompiler;
pub use registry::FilterRegistry;
pub use resolver::MembershipResolver;
pub use selector_options::ProductSelectorOptions;
pub use service::{Assessment, SkippedCondition, SubscriptionRules};
