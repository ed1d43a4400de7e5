//! Value Objects module
//!
//! Immutable, validated domain primitives.

pub mod operator;
pub mod selector;
pub mod status;

pub use operator::Operator;
pub use selector::ProductSelector;
pub use status::SubscriptionStatus;
