//! In-memory subscription store (for testing)

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::query::{CustomerLookup, CustomerSubscriptionQuery, MembershipQuery};
use crate::domain::records::{CustomerRecord, SubscriptionRecord};
use crate::ports::outbound::{CustomerRow, IdentityRow, StoreError, SubscriptionStore};

/// Evaluates structured predicates over in-memory rows and counts round-trips
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    customers: RwLock<Vec<CustomerRecord>>,
    subscriptions: RwLock<Vec<SubscriptionRecord>>,
    calls: AtomicUsize,
    failure: RwLock<Option<StoreError>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_customer(&self, customer: CustomerRecord) {
        self.customers.write().push(customer);
    }

    pub fn insert_subscription(&self, subscription: SubscriptionRecord) {
        self.subscriptions.write().push(subscription);
    }

    /// Number of queries received, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fail every query with `error` until `recover` is called
    pub fn fail_with(&self, error: StoreError) {
        *self.failure.write() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.write() = None;
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.read().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn fetch_identities(&self, query: &MembershipQuery) -> Result<Vec<IdentityRow>, StoreError> {
        self.begin()?;
        let customers = self.customers.read();
        let subscriptions = self.subscriptions.read();

        Ok(subscriptions
            .iter()
            .filter(|sub| query.predicate().matches(sub))
            .filter_map(|sub| customers.iter().find(|c| c.id == sub.customer_id))
            .map(|customer| IdentityRow {
                account_id: customer.account_id,
                email: customer.email.clone(),
            })
            .collect())
    }

    fn find_customers(&self, lookup: &CustomerLookup) -> Result<Vec<CustomerRow>, StoreError> {
        self.begin()?;
        let customers = self.customers.read();

        let mut rows: Vec<CustomerRow> = customers
            .iter()
            .filter(|c| {
                let by_account = lookup
                    .account_id()
                    .is_some_and(|id| c.account_id == Some(id as i64));
                let by_email = lookup
                    .email()
                    .is_some_and(|email| c.email.as_deref() == Some(email));
                by_account || by_email
            })
            .map(|c| CustomerRow { id: c.id, account_id: c.account_id, email: c.email.clone() })
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn has_matching_subscription(&self, query: &CustomerSubscriptionQuery) -> Result<bool, StoreError> {
        self.begin()?;
        Ok(self
            .subscriptions
            .read()
            .iter()
            .any(|sub| sub.customer_id == query.customer_id() && query.predicate().matches(sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Schema;
    use crate::domain::{ProductSelector, SubscriptionPredicate, SubscriptionStatus};

    fn store() -> InMemorySubscriptionStore {
        let store = InMemorySubscriptionStore::new();
        store.insert_customer(CustomerRecord { id: 1, account_id: Some(10), email: Some("a@example.com".into()) });
        store.insert_customer(CustomerRecord { id: 2, account_id: None, email: Some("b@example.com".into()) });
        for (id, customer_id, status) in [(1, 1, "active"), (2, 1, "active"), (3, 2, "expired"), (4, 99, "active")] {
            store.insert_subscription(SubscriptionRecord {
                id,
                customer_id,
                product_id: 42,
                price_id: None,
                status: status.into(),
                expiration: None,
            });
        }
        store
    }

    fn active_42() -> SubscriptionPredicate {
        SubscriptionPredicate::build(vec![ProductSelector::product(42)], vec![SubscriptionStatus::Active], None).unwrap()
    }

    #[test]
    fn test_fetch_identities_joins_customers_without_dedup() {
        let store = store();
        let rows = store.fetch_identities(&MembershipQuery::new(&Schema::default(), active_42())).unwrap();
        // Two active subscriptions of customer 1; the orphan row has no customer to join
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.account_id == Some(10)));
        assert_eq!(store.call_count(), 1);
    }

    #[test]
    fn test_find_customers_by_either_key() {
        let store = store();
        let lookup = CustomerLookup::new(&Schema::default(), Some(10), Some("b@example.com")).unwrap();
        let ids: Vec<_> = store.find_customers(&lookup).unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_has_matching_subscription_scoped_to_customer() {
        let store = store();
        let schema = Schema::default();
        assert!(store.has_matching_subscription(&CustomerSubscriptionQuery::new(&schema, 1, active_42())).unwrap());
        assert!(!store.has_matching_subscription(&CustomerSubscriptionQuery::new(&schema, 2, active_42())).unwrap());
    }

    #[test]
    fn test_failure_injection() {
        let store = store();
        store.fail_with(StoreError::Connection("down".into()));
        let err = store
            .fetch_identities(&MembershipQuery::new(&Schema::default(), active_42()))
            .unwrap_err();
        assert_eq!(err, StoreError::Connection("down".into()));
        store.recover();
        assert!(store.fetch_identities(&MembershipQuery::new(&Schema::default(), active_42())).is_ok());
        assert_eq!(store.call_count(), 2);
    }
}
