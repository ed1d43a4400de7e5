//! Membership resolver
//!
//! First phase of the bulk path: one store round-trip per condition,
//! collapsing matching subscriptions into the identities that own them.

use std::sync::Arc;

use crate::config::Schema;
use crate::domain::{MatchedIdentitySet, MembershipQuery, SubscriptionPredicate};
use crate::error::RuleResult;
use crate::ports::outbound::SubscriptionStore;

pub struct MembershipResolver {
    store: Arc<dyn SubscriptionStore>,
    schema: Schema,
}

impl MembershipResolver {
    pub fn new(store: Arc<dyn SubscriptionStore>, schema: Schema) -> Self {
        Self { store, schema }
    }

    /// Store failures propagate; an empty set always means no match
    pub fn resolve(&self, predicate: SubscriptionPredicate) -> RuleResult<MatchedIdentitySet> {
        let query = MembershipQuery::new(&self.schema, predicate);
        tracing::debug!(
            placeholders = query.fragment().placeholder_count(),
            "resolving subscription membership"
        );

        let rows = self.store.fetch_identities(&query)?;
        let row_count = rows.len();
        let identities = MatchedIdentitySet::from_rows(rows);

        tracing::debug!(
            rows = row_count,
            account_ids = identities.account_ids().len(),
            emails = identities.emails().len(),
            "identity set resolved"
        );
        Ok(identities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerRecord, ProductSelector, SubscriptionRecord, SubscriptionStatus};
    use crate::error::RuleError;
    use crate::infrastructure::InMemorySubscriptionStore;
    use crate::ports::outbound::StoreError;

    fn store() -> Arc<InMemorySubscriptionStore> {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store.insert_customer(CustomerRecord { id: 1, account_id: Some(1), email: Some("one@example.com".into()) });
        store.insert_customer(CustomerRecord { id: 2, account_id: Some(0), email: Some("two@example.com".into()) });
        for (id, customer_id) in [(1, 1), (2, 1), (3, 2)] {
            store.insert_subscription(SubscriptionRecord {
                id,
                customer_id,
                product_id: 42,
                price_id: None,
                status: "active".into(),
                expiration: None,
            });
        }
        store
    }

    fn predicate() -> SubscriptionPredicate {
        SubscriptionPredicate::build(vec![ProductSelector::product(42)], vec![SubscriptionStatus::Active], None).unwrap()
    }

    #[test]
    fn test_resolve_dedupes_rows() {
        let store = store();
        let resolver = MembershipResolver::new(store.clone(), Schema::default());
        let identities = resolver.resolve(predicate()).unwrap();

        assert_eq!(identities.account_ids().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(identities.emails().len(), 2);
        assert_eq!(store.call_count(), 1);
    }

    #[test]
    fn test_store_failure_is_not_an_empty_set() {
        let store = store();
        store.fail_with(StoreError::Query("syntax".into()));
        let resolver = MembershipResolver::new(store, Schema::default());
        assert!(matches!(resolver.resolve(predicate()), Err(RuleError::ResolutionFailed(_))));
    }
}
