//! Infrastructure Layer
//!
//! In-memory adapters for the outbound ports, used by tests and local tooling.

pub mod clock;
pub mod gates;
pub mod persistence;
pub mod product_catalog;
pub mod query;

pub use clock::{FixedClock, SystemClock};
pub use gates::StaticFeatureGates;
pub use persistence::InMemorySubscriptionStore;
pub use product_catalog::InMemoryProductCatalog;
pub use query::{Clause, Connector, RecordingQueryBuilder};
